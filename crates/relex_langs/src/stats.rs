//! Per-language lexer work counters.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct LexerStats {
    created: AtomicUsize,
    restarts: AtomicUsize,
    tokens: AtomicUsize,
}

impl LexerStats {
    /// Lexer instances created; pooled instances are counted once.
    pub fn lexers_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Tokens and skips returned by all lexers of the language.
    pub fn tokens_lexed(&self) -> usize {
        self.tokens.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.created.store(0, Ordering::Relaxed);
        self.restarts.store(0, Ordering::Relaxed);
        self.tokens.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_token(&self) {
        self.tokens.fetch_add(1, Ordering::Relaxed);
    }
}
