//! Driving lexers over token list content.
//!
//! A [`LexRun`] wraps one pooled lexer and one [`LexerInput`] and checks
//! every answer against the lexer contract: tokens are non-empty, a token or
//! skip covers exactly the characters consumed, and `None` only comes once
//! the input is exhausted. Skips are folded into the next token's
//! `skipped_before` or into the trailing skip.

mod pool;

pub(crate) use pool::LexerPool;
use pool::PooledLexer;

use relex_ir::LexerState;
use relex_lang::{EmbeddingResolver, LanguagePath};
use relex_lexer_core::{InputAttributes, LexedToken, LexerInput, LexerRestartInfo};

use crate::config::HierarchyConfig;
use crate::list::LexedEntry;
use crate::TokenHierarchyError;

/// Everything a lexing or update pass reads besides the arena.
#[derive(Clone, Copy)]
pub(crate) struct LexContext<'a> {
    /// Full input text.
    pub text: &'a str,
    pub attributes: Option<&'a InputAttributes>,
    pub resolver: &'a EmbeddingResolver,
    pub pool: &'a LexerPool,
    pub config: &'a HierarchyConfig,
}

impl<'a> LexContext<'a> {
    /// Input text of a list's content area.
    pub fn content(
        &self,
        path: &LanguagePath,
        base: u32,
        len: u32,
    ) -> Result<&'a str, TokenHierarchyError> {
        let end = base.saturating_add(len);
        self.text
            .get(base as usize..end as usize)
            .ok_or_else(|| TokenHierarchyError::ContentOutOfRange {
                path: path.mime_path().to_owned(),
                start: base,
                end,
            })
    }
}

/// What a run produced next.
#[derive(Debug)]
pub(crate) enum Produced {
    Token(LexedEntry),
    /// Input exhausted; skipped bytes after the last token.
    End { trailing_skip: u32 },
}

pub(crate) struct LexRun<'a> {
    lexer: PooledLexer<'a>,
    input: LexerInput<'a>,
    path: &'a LanguagePath,
    /// Absolute offset of the content start, for diagnostics.
    base: u32,
    pending_skip: u32,
}

impl<'a> LexRun<'a> {
    /// Start lexing `content` at `offset` in `state`, resuming a flyweight
    /// run of `flyweight_run` tokens.
    pub fn new(
        cx: &LexContext<'a>,
        path: &'a LanguagePath,
        content: &'a str,
        base: u32,
        offset: u32,
        state: &LexerState,
        flyweight_run: u32,
    ) -> Self {
        let info = LexerRestartInfo::new(state, path.mime_path()).with_attributes(cx.attributes);
        let lexer = cx.pool.take(path.inner_language(), &info);
        let skip_ids = cx
            .attributes
            .and_then(|attributes| attributes.skip_token_ids(path.mime_path()));
        let input = LexerInput::new(content, offset)
            .with_flyweight_run(flyweight_run, cx.config.max_flyweight_run)
            .with_skip_ids(skip_ids);
        LexRun {
            lexer,
            input,
            path,
            base,
            pending_skip: 0,
        }
    }

    pub fn next(&mut self) -> Result<Produced, TokenHierarchyError> {
        loop {
            let start = self.input.token_start();
            match self.lexer.next_token(&mut self.input) {
                None => {
                    if !self.input.is_exhausted() {
                        return Err(self.malfunction());
                    }
                    return Ok(Produced::End {
                        trailing_skip: std::mem::take(&mut self.pending_skip),
                    });
                }
                Some(LexedToken::Skip(len)) => {
                    if len == 0 || self.input.token_start() != start + len {
                        return Err(self.malfunction());
                    }
                    tracing::trace!(offset = start, len, "skipped");
                    self.pending_skip += len;
                }
                Some(LexedToken::Token(token)) => {
                    if token.is_empty() {
                        tracing::error!(
                            path = %self.path,
                            offset = self.base + start,
                            token = %token.id(),
                            "zero-length token"
                        );
                        return Err(TokenHierarchyError::ZeroLengthToken {
                            path: self.path.mime_path().to_owned(),
                            offset: self.base + start,
                            token: token.id().name(),
                        });
                    }
                    if self.input.token_start() != start + token.len() {
                        return Err(self.malfunction());
                    }
                    return Ok(Produced::Token(LexedEntry {
                        offset: start,
                        skipped_before: std::mem::take(&mut self.pending_skip),
                        lookahead: self.input.last_lookahead(),
                        state: self.lexer.state(),
                        flyweight_run: self.input.flyweight_run(),
                        token,
                    }));
                }
            }
        }
    }

    fn malfunction(&self) -> TokenHierarchyError {
        let offset = self.input.token_start();
        let unread = self.input.end().saturating_sub(offset);
        tracing::error!(
            path = %self.path,
            offset = self.base + offset,
            unread,
            "lexer malfunction"
        );
        TokenHierarchyError::LexerMalfunction {
            path: self.path.mime_path().to_owned(),
            offset: self.base + offset,
            unread,
        }
    }
}

/// Tokens of a whole content area.
#[derive(Debug)]
pub(crate) struct BatchLex {
    pub entries: Vec<LexedEntry>,
    pub trailing_skip: u32,
}

/// Lex `content` from the start in `state`.
pub(crate) fn lex_all(
    cx: &LexContext<'_>,
    path: &LanguagePath,
    content: &str,
    base: u32,
    state: &LexerState,
) -> Result<BatchLex, TokenHierarchyError> {
    let mut run = LexRun::new(cx, path, content, base, 0, state, 0);
    let mut entries = Vec::new();
    loop {
        match run.next()? {
            Produced::Token(entry) => entries.push(entry),
            Produced::End { trailing_skip } => {
                return Ok(BatchLex {
                    entries,
                    trailing_skip,
                })
            }
        }
    }
}
