//! Cursor over the text being lexed, plus the token factory.
//!
//! Offsets are byte offsets into the lexed text (the whole input for a root
//! token list, the embedded content area for an embedded one). Reads are
//! char-oriented and never split a UTF-8 sequence.
//!
//! # Lookahead
//!
//! The input keeps a high-water mark of every byte the lexer examined,
//! including bytes it later backed up over. Asking for a character at the
//! end of the text counts as examining one byte past the end, so a token
//! ending at the end of input whose lexer looked for more has a lookahead
//! of one. When a token is created, its lookahead is the high-water mark
//! minus the token's end and the mark resets to the new token boundary.
//! Skipped stretches keep the mark so their lookahead is charged to the
//! next stored token.

use std::sync::Arc;

use relex_ir::{PartType, Token, TokenId, TokenIdSet, TokenPropertyProvider};

use crate::{LexedToken, MAX_FLYWEIGHT_RUN};

/// Cursor handed to [`Lexer::next_token`](crate::Lexer::next_token).
#[derive(Debug)]
pub struct LexerInput<'a> {
    text: &'a str,
    /// Start of the token being scanned.
    token_start: u32,
    /// Current read position.
    pos: u32,
    /// One past the furthest byte examined since the last stored token.
    max_read: u32,
    /// Lookahead of the most recently created token.
    last_lookahead: u32,
    /// Consecutive flyweight tokens handed out so far.
    flyweight_run: u32,
    flyweight_limit: u32,
    skip_ids: Option<&'a TokenIdSet>,
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "char::len_utf8() is at most 4"
)]
#[inline]
fn char_len(ch: char) -> u32 {
    ch.len_utf8() as u32
}

impl<'a> LexerInput<'a> {
    /// Input over `text`, positioned at `start`.
    ///
    /// `start` must be a char boundary; the lexer cannot see or back up
    /// before it.
    pub fn new(text: &'a str, start: u32) -> Self {
        debug_assert!(
            text.is_char_boundary(start as usize),
            "lexing must start on a char boundary"
        );
        LexerInput {
            text,
            token_start: start,
            pos: start,
            max_read: start,
            last_lookahead: 0,
            flyweight_run: 0,
            flyweight_limit: MAX_FLYWEIGHT_RUN,
            skip_ids: None,
        }
    }

    /// Resume a flyweight run of `run` tokens, capped at `limit`.
    #[must_use]
    pub fn with_flyweight_run(mut self, run: u32, limit: u32) -> Self {
        self.flyweight_run = run;
        self.flyweight_limit = limit;
        self
    }

    /// Token ids to report as [`LexedToken::Skip`].
    #[must_use]
    pub fn with_skip_ids(mut self, skip_ids: Option<&'a TokenIdSet>) -> Self {
        self.skip_ids = skip_ids;
        self
    }

    // === Positions ===

    /// Byte length of the lexed text.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "token list text is bounded by u32 offsets"
    )]
    #[inline]
    pub fn end(&self) -> u32 {
        self.text.len() as u32
    }

    /// Current read position.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.pos
    }

    /// Start of the token being scanned.
    #[inline]
    pub fn token_start(&self) -> u32 {
        self.token_start
    }

    /// `true` when every byte has been committed to a token.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.token_start >= self.end()
    }

    /// `true` when the read position is at the end of the text.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.end()
    }

    /// Lookahead recorded for the most recently created token.
    #[inline]
    pub fn last_lookahead(&self) -> u32 {
        self.last_lookahead
    }

    /// Flyweight tokens handed out in a row, ending at the last token.
    #[inline]
    pub fn flyweight_run(&self) -> u32 {
        self.flyweight_run
    }

    // === Reading ===

    /// Text from the read position to the end. Does not count as examined;
    /// pair with [`note_lookahead`](Self::note_lookahead) or
    /// [`advance`](Self::advance).
    #[inline]
    pub fn remaining(&self) -> &'a str {
        self.text.get(self.pos as usize..).unwrap_or("")
    }

    /// Read the next character. At the end of the text, returns `None`
    /// and counts one byte of lookahead.
    pub fn read(&mut self) -> Option<char> {
        let Some(ch) = self.remaining().chars().next() else {
            self.touch(self.end() + 1);
            return None;
        };
        self.pos += char_len(ch);
        self.touch(self.pos);
        Some(ch)
    }

    /// Examine the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        let ch = self.remaining().chars().next();
        let examined = ch.map_or(self.end() + 1, |ch| self.pos + char_len(ch));
        self.touch(examined);
        ch
    }

    /// Step back over `chars` characters. Never moves before the start of
    /// the current token.
    pub fn backup(&mut self, chars: usize) {
        let read = self
            .text
            .get(self.token_start as usize..self.pos as usize)
            .unwrap_or("");
        let back: u32 = read.chars().rev().take(chars).map(char_len).sum();
        self.pos -= back;
    }

    /// Bytes read for the current token.
    #[inline]
    pub fn read_length(&self) -> u32 {
        self.pos - self.token_start
    }

    /// Text read for the current token.
    #[inline]
    pub fn read_text(&self) -> &'a str {
        self.text
            .get(self.token_start as usize..self.pos as usize)
            .unwrap_or("")
    }

    /// Consume characters while `pred` holds. The first rejected character
    /// counts as examined. Returns the number of bytes consumed.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> u32 {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += char_len(ch);
        }
        self.pos - start
    }

    /// Advance to the next occurrence of the ASCII byte `needle`, leaving it
    /// unread. Returns `false` (positioned at the end) when there is none.
    pub fn eat_until_byte(&mut self, needle: u8) -> bool {
        debug_assert!(needle.is_ascii(), "needle must not split a UTF-8 sequence");
        let found = memchr::memchr(needle, self.remaining().as_bytes());
        self.settle_scan(found)
    }

    /// Like [`eat_until_byte`](Self::eat_until_byte) with two needles.
    pub fn eat_until_either(&mut self, a: u8, b: u8) -> bool {
        debug_assert!(a.is_ascii() && b.is_ascii(), "needles must be ASCII");
        let found = memchr::memchr2(a, b, self.remaining().as_bytes());
        self.settle_scan(found)
    }

    /// Check whether the unread text starts with `prefix`. The compared
    /// bytes count as examined.
    pub fn starts_with(&mut self, prefix: &str) -> bool {
        let matched = self.remaining().starts_with(prefix);
        let examined = self.pos.saturating_add(u32::try_from(prefix.len()).unwrap_or(u32::MAX));
        self.touch(examined.min(self.end() + 1));
        matched
    }

    /// Consume `prefix` if the unread text starts with it.
    pub fn consume(&mut self, prefix: &str) -> bool {
        if !self.starts_with(prefix) {
            return false;
        }
        self.pos += u32::try_from(prefix.len()).unwrap_or(0);
        true
    }

    /// Consume `bytes` bytes of [`remaining`](Self::remaining) text. Used by
    /// lexers that scan the remaining text with another engine.
    pub fn advance(&mut self, bytes: u32) {
        let target = self.pos.saturating_add(bytes).min(self.end());
        debug_assert!(
            self.text.is_char_boundary(target as usize),
            "advance must stop on a char boundary"
        );
        self.pos = target;
        self.touch(self.pos);
    }

    /// Record that `bytes` bytes past the read position were examined.
    /// Examining past the end counts one byte of lookahead.
    pub fn note_lookahead(&mut self, bytes: u32) {
        let examined = self.pos.saturating_add(bytes);
        self.touch(examined.min(self.end() + 1));
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "scan offsets are bounded by the text length"
    )]
    fn settle_scan(&mut self, found: Option<usize>) -> bool {
        match found {
            Some(offset) => {
                self.pos += offset as u32;
                self.touch(self.pos + 1);
                true
            }
            None => {
                self.pos = self.end();
                self.touch(self.end() + 1);
                false
            }
        }
    }

    #[inline]
    fn touch(&mut self, examined: u32) {
        self.max_read = self.max_read.max(examined);
    }

    // === Token factory ===

    /// Token covering everything read.
    pub fn create_token(&mut self, id: TokenId) -> LexedToken {
        self.create_part_token(id, PartType::Complete)
    }

    /// Token covering everything read, with a part type.
    pub fn create_part_token(&mut self, id: TokenId, part: PartType) -> LexedToken {
        let len = self.read_length();
        self.emit(Token::with_part(id, len, part))
    }

    /// Token covering the first `len` bytes of the current token. Bytes
    /// read beyond `len` are put back but stay counted as lookahead.
    pub fn create_token_with_len(&mut self, id: TokenId, len: u32, part: PartType) -> LexedToken {
        let len = self.clamp_len(len);
        self.emit(Token::with_part(id, len, part))
    }

    /// Flyweight token for state-independent `text`, which must equal the
    /// read text. After [`MAX_FLYWEIGHT_RUN`] flyweights in a row a
    /// buffer-backed token is returned instead.
    pub fn flyweight_token(&mut self, id: TokenId, text: &'static str) -> LexedToken {
        debug_assert_eq!(self.read_text(), text, "flyweight text must match input");
        let len = self.clamp_len(u32::try_from(text.len()).unwrap_or(u32::MAX));
        if self.is_skipped(id) {
            return self.skip(len);
        }
        if self.flyweight_run >= self.flyweight_limit {
            self.flyweight_run = 0;
            self.commit(len);
            return LexedToken::Token(Token::new(id, len));
        }
        self.flyweight_run += 1;
        self.commit(len);
        LexedToken::Token(Token::flyweight(id, text))
    }

    /// Token of `len` bytes presenting `text` instead of the input.
    pub fn custom_text_token(
        &mut self,
        id: TokenId,
        text: Arc<str>,
        len: u32,
        part: PartType,
    ) -> LexedToken {
        let len = self.clamp_len(len);
        self.emit(Token::custom_text(id, len, part, text))
    }

    /// Token of `len` bytes with a property provider.
    pub fn property_token(
        &mut self,
        id: TokenId,
        len: u32,
        part: PartType,
        provider: Arc<dyn TokenPropertyProvider>,
    ) -> LexedToken {
        let len = self.clamp_len(len);
        self.emit(Token::with_properties(id, len, part, provider))
    }

    fn clamp_len(&self, len: u32) -> u32 {
        len.min(self.end() - self.token_start)
    }

    fn is_skipped(&self, id: TokenId) -> bool {
        self.skip_ids.is_some_and(|ids| ids.contains(id))
    }

    fn emit(&mut self, token: Token) -> LexedToken {
        let len = token.len();
        if self.is_skipped(token.id()) {
            return self.skip(len);
        }
        self.flyweight_run = 0;
        self.commit(len);
        LexedToken::Token(token)
    }

    fn skip(&mut self, len: u32) -> LexedToken {
        let end = self.token_start + len;
        self.touch(end);
        self.pos = end;
        self.token_start = end;
        LexedToken::Skip(len)
    }

    fn commit(&mut self, len: u32) {
        let end = self.token_start + len;
        self.touch(end);
        self.last_lookahead = self.max_read - end;
        self.pos = end;
        self.token_start = end;
        self.max_read = end;
    }
}
