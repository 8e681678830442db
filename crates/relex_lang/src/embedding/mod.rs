//! Embedded languages inside tokens.

mod resolver;

pub use resolver::{EmbeddingDecision, EmbeddingResolver};

use relex_ir::Token;
use relex_lexer_core::InputAttributes;

use crate::language::Language;
use crate::path::LanguagePath;

/// Where and how a language is embedded in a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingSpec {
    pub language: Language,
    /// Bytes at the token start that stay outside the embedding.
    pub start_skip: u32,
    /// Bytes at the token end that stay outside the embedding.
    pub end_skip: u32,
    /// Lex consecutive embedded sections of this language path under one
    /// parent as one stream.
    pub join_sections: bool,
}

impl EmbeddingSpec {
    pub fn new(language: Language, start_skip: u32, end_skip: u32) -> Self {
        EmbeddingSpec {
            language,
            start_skip,
            end_skip,
            join_sections: false,
        }
    }

    #[must_use]
    pub fn joined(mut self) -> Self {
        self.join_sections = true;
        self
    }

    /// `true` if the skips fit in a token of `token_len` bytes.
    pub fn fits(&self, token_len: u32) -> bool {
        self.start_skip
            .checked_add(self.end_skip)
            .is_some_and(|skips| skips <= token_len)
    }
}

/// Caching policy for embedding decisions, per token id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EmbeddingPresence {
    /// Tokens with this id never host an embedding.
    None,
    /// The first decision for this id at a language path is reused.
    #[default]
    CachedFirstQuery,
    /// Every token is asked again; decisions may depend on the token.
    AlwaysQuery,
}

/// Arguments of an embedding query.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddingQuery<'a> {
    pub token: &'a Token,
    /// Text the token covers.
    pub text: &'a str,
    /// Path of the list the token lives in.
    pub path: &'a LanguagePath,
    pub attributes: Option<&'a InputAttributes>,
}
