//! Errors raised by token hierarchy operations.

use thiserror::Error;

/// Failure of a hierarchy operation.
///
/// Lexer failures are fatal for the operation that hit them: the hierarchy
/// drops every token list and relexes from scratch on the next query.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TokenHierarchyError {
    /// The lexer stopped before consuming all input, or claimed more or
    /// fewer characters than it consumed.
    #[error("lexer for `{path}` malfunctioned at offset {offset}: {unread} bytes left unread")]
    LexerMalfunction {
        path: String,
        offset: u32,
        unread: u32,
    },
    #[error("lexer for `{path}` produced a zero-length `{token}` token at offset {offset}")]
    ZeroLengthToken {
        path: String,
        offset: u32,
        token: &'static str,
    },
    /// The reported edit does not match the text lengths.
    #[error(
        "modification at {offset} removing {removed} bytes does not fit text of {text_len} bytes"
    )]
    InvalidModification {
        offset: u32,
        removed: u32,
        text_len: u32,
    },
    /// An embedded list's content does not lie on char boundaries of the
    /// input.
    #[error("content {start}..{end} of `{path}` is not a valid text range")]
    ContentOutOfRange { path: String, start: u32, end: u32 },
    #[error("token hierarchy is inactive")]
    Inactive,
    #[error("no token at offset {offset}")]
    NoSuchToken { offset: u32 },
    #[error(
        "embedding skips {start_skip}+{end_skip} do not fit token `{token}` of length {len}"
    )]
    EmbeddingDoesNotFit {
        token: &'static str,
        len: u32,
        start_skip: u32,
        end_skip: u32,
    },
}
