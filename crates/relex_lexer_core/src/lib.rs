//! Lexer contract for relex.
//!
//! A language plugs into the engine by implementing [`Lexer`]. The engine
//! hands the lexer a [`LexerInput`] positioned at a token boundary; the
//! lexer reads characters, then asks the input to create a token covering
//! what it read. The input records how far past the token the lexer looked
//! (its lookahead) so the engine knows which later edits can change the
//! lexer's decision.
//!
//! # Determinism
//!
//! Given the same characters from a token boundary onward and the same
//! [`LexerState`], a lexer must produce the same tokens. Incremental relexing
//! restarts lexers mid-document and relies on this.

mod attributes;
mod input;

pub use attributes::{AttributeValue, InputAttributes};
pub use input::LexerInput;

use relex_ir::{LexerState, Token};

/// Consecutive flyweight tokens allowed before the input hands out a
/// buffer-backed token instead.
pub const MAX_FLYWEIGHT_RUN: u32 = 5;

/// What a lexer returns for each consumed stretch of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexedToken {
    /// A token to store in the token list.
    Token(Token),
    /// Input of the given length whose token id is filtered out. The bytes
    /// are consumed but no token is stored.
    Skip(u32),
}

impl LexedToken {
    /// Number of input bytes consumed.
    pub fn len(&self) -> u32 {
        match self {
            LexedToken::Token(token) => token.len(),
            LexedToken::Skip(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            LexedToken::Token(token) => Some(token),
            LexedToken::Skip(_) => None,
        }
    }
}

/// Context a lexer is (re)started with.
#[derive(Clone, Copy, Debug)]
pub struct LexerRestartInfo<'a> {
    /// State recorded after the token preceding the restart point.
    pub state: &'a LexerState,
    /// Mime path of the language path being lexed, e.g. `text/x-tmpl/text/x-calc`.
    pub mime_path: &'a str,
    /// Attributes of the mutable input, if it has any.
    pub attributes: Option<&'a InputAttributes>,
}

impl<'a> LexerRestartInfo<'a> {
    pub fn new(state: &'a LexerState, mime_path: &'a str) -> Self {
        LexerRestartInfo {
            state,
            mime_path,
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Option<&'a InputAttributes>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Attribute for the lexed language path.
    pub fn attribute(&self, key: &str) -> Option<&'a AttributeValue> {
        self.attributes
            .and_then(|attributes| attributes.get(self.mime_path, key))
    }
}

/// Per-language scanner.
///
/// Instances are pooled by the engine. A new instance is created at the
/// restart point; a reused one is [`restart`](Lexer::restart)ed there. Either
/// way it is [`release`](Lexer::release)d after the run.
pub trait Lexer: Send {
    /// Produce the next token, or `None` once the input is exhausted.
    ///
    /// Returning `None` while unread input remains is a malfunction; the
    /// engine reports it and discards the affected token list.
    fn next_token(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken>;

    /// State after the most recently returned token.
    fn state(&self) -> LexerState;

    /// Reset to the given state before scanning from a token boundary.
    fn restart(&mut self, info: &LexerRestartInfo<'_>);

    /// Drop references held from the last run.
    fn release(&mut self) {}
}
