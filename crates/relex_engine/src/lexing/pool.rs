//! Per-language pool of idle lexer instances.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use relex_lang::{Language, LanguageId};
use relex_lexer_core::{Lexer, LexerRestartInfo};

pub(crate) struct LexerPool {
    idle: Mutex<FxHashMap<LanguageId, Vec<Box<dyn Lexer>>>>,
    capacity: usize,
}

impl LexerPool {
    pub fn new(capacity: usize) -> Self {
        LexerPool {
            idle: Mutex::new(FxHashMap::default()),
            capacity,
        }
    }

    /// A lexer for `language` positioned at `info`: an idle instance
    /// restarted there, or a new one created there.
    pub fn take(&self, language: &Language, info: &LexerRestartInfo<'_>) -> PooledLexer<'_> {
        let reused = self
            .idle
            .lock()
            .get_mut(&language.id())
            .and_then(Vec::pop);
        let lexer = match reused {
            Some(mut lexer) => {
                lexer.restart(info);
                lexer
            }
            None => language.create_lexer(info),
        };
        PooledLexer {
            pool: self,
            language: language.id(),
            lexer: Some(lexer),
        }
    }

    /// Idle instances kept for `language`.
    #[cfg(test)]
    pub fn idle(&self, language: &Language) -> usize {
        self.idle.lock().get(&language.id()).map_or(0, Vec::len)
    }

    fn give_back(&self, language: LanguageId, mut lexer: Box<dyn Lexer>) {
        lexer.release();
        let mut idle = self.idle.lock();
        let instances = idle.entry(language).or_default();
        if instances.len() < self.capacity {
            instances.push(lexer);
        }
    }
}

impl std::fmt::Debug for LexerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let idle: usize = self.idle.lock().values().map(Vec::len).sum();
        f.debug_struct("LexerPool")
            .field("idle", &idle)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A lexer on loan from the pool; returned when dropped.
pub(crate) struct PooledLexer<'p> {
    pool: &'p LexerPool,
    language: LanguageId,
    lexer: Option<Box<dyn Lexer>>,
}

impl Deref for PooledLexer<'_> {
    type Target = dyn Lexer;

    fn deref(&self) -> &Self::Target {
        match &self.lexer {
            Some(lexer) => lexer.as_ref(),
            None => unreachable!("lexer is only taken on drop"),
        }
    }
}

impl DerefMut for PooledLexer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.lexer {
            Some(lexer) => lexer.as_mut(),
            None => unreachable!("lexer is only taken on drop"),
        }
    }
}

impl Drop for PooledLexer<'_> {
    fn drop(&mut self) {
        if let Some(lexer) = self.lexer.take() {
            self.pool.give_back(self.language, lexer);
        }
    }
}
