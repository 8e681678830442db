//! Minimal languages for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use relex_ir::{LexerState, TokenId};
use relex_lexer_core::{LexedToken, Lexer, LexerInput, LexerRestartInfo};

use crate::{EmbeddingPresence, EmbeddingQuery, EmbeddingSpec, Language, LanguageHierarchy};

pub const WORD: TokenId = TokenId::with_category("WORD", 0, "identifier");
pub const QUOTED: TokenId = TokenId::with_category("QUOTED", 1, "literal");
pub const OTHER: TokenId = TokenId::new("OTHER", 2);

/// Lexer producing one `WORD` per char; never asked for tokens in these tests.
struct CharLexer;

impl Lexer for CharLexer {
    fn next_token(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        input.read()?;
        Some(input.create_token(WORD))
    }

    fn state(&self) -> LexerState {
        LexerState::Default
    }

    fn restart(&mut self, _info: &LexerRestartInfo<'_>) {}
}

/// Language whose `QUOTED` tokens embed `inner` with one-byte skips.
pub struct Outer {
    pub inner: Option<Language>,
    pub presence: EmbeddingPresence,
    pub hook_calls: Arc<AtomicUsize>,
}

impl LanguageHierarchy for Outer {
    fn mime_type(&self) -> &'static str {
        "text/x-outer"
    }

    fn token_ids(&self) -> Vec<TokenId> {
        vec![WORD, QUOTED, OTHER]
    }

    fn token_categories(&self) -> Vec<(&'static str, Vec<TokenId>)> {
        vec![("text", vec![WORD, QUOTED])]
    }

    fn create_lexer(&self, _info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        Box::new(CharLexer)
    }

    fn embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        self.hook_calls.fetch_add(1, Ordering::Relaxed);
        if query.token.id() != QUOTED {
            return None;
        }
        self.inner
            .clone()
            .map(|language| EmbeddingSpec::new(language, 1, 1))
    }

    fn embedding_presence(&self, id: TokenId) -> EmbeddingPresence {
        if id == OTHER {
            EmbeddingPresence::None
        } else {
            self.presence
        }
    }
}

/// Language with a single id and no embeddings.
pub struct Inner(pub &'static str);

impl LanguageHierarchy for Inner {
    fn mime_type(&self) -> &'static str {
        self.0
    }

    fn token_ids(&self) -> Vec<TokenId> {
        vec![WORD]
    }

    fn create_lexer(&self, _info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        Box::new(CharLexer)
    }
}

pub fn inner(mime_type: &'static str) -> Language {
    match Language::new(Inner(mime_type)) {
        Ok(language) => language,
        Err(error) => panic!("test language rejected: {error}"),
    }
}

pub fn outer(inner: Option<Language>, presence: EmbeddingPresence) -> (Language, Arc<AtomicUsize>) {
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let hierarchy = Outer {
        inner,
        presence,
        hook_calls: Arc::clone(&hook_calls),
    };
    match Language::new(hierarchy) {
        Ok(language) => (language, hook_calls),
        Err(error) => panic!("test language rejected: {error}"),
    }
}
