//! Bidirectional cursor over one token list.
//!
//! A [`TokenSequence`] borrows its hierarchy, so the list it walks cannot be
//! modified while the sequence is alive. Embedded lists reached through
//! [`TokenSequence::embedded`] are created on first request.

mod joined;

use std::borrow::Cow;

use relex_ir::{LexerState, Token, TokenText};
use relex_lang::{Language, LanguagePath};

use crate::hierarchy::TokenHierarchy;
use crate::input::MutableTextInput;
use crate::list::ListId;

pub use joined::{JoinedToken, JoinedTokenSequence};

/// A token with its absolute offset. Flyweight tokens are shared between
/// occurrences and carry no offset of their own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedToken {
    pub token: Token,
    pub offset: Option<u32>,
}

pub struct TokenSequence<'h, I: MutableTextInput> {
    hierarchy: &'h TokenHierarchy<I>,
    list: ListId,
    /// Absolute offset of the list's content.
    base: u32,
    path: LanguagePath,
    count: usize,
    /// Index `move_next` goes to when there is no current token.
    position: usize,
    current: Option<usize>,
}

impl<'h, I: MutableTextInput> TokenSequence<'h, I> {
    pub(crate) fn new(
        hierarchy: &'h TokenHierarchy<I>,
        list: ListId,
        base: u32,
        path: LanguagePath,
    ) -> Self {
        let count = hierarchy.read_state().list(list).len();
        TokenSequence {
            hierarchy,
            list,
            base,
            path,
            count,
            position: 0,
            current: None,
        }
    }

    // === Movement ===

    /// Move to the next token. Returns `false`, without moving, at the end.
    pub fn move_next(&mut self) -> bool {
        let target = self.current.map_or(self.position, |index| index + 1);
        if target >= self.count {
            return false;
        }
        self.current = Some(target);
        self.position = target + 1;
        true
    }

    /// Move to the previous token. Returns `false`, without moving, at the
    /// start.
    pub fn move_previous(&mut self) -> bool {
        let target = self.current.unwrap_or(self.position).checked_sub(1);
        let Some(target) = target else {
            return false;
        };
        self.current = Some(target);
        self.position = target + 1;
        true
    }

    /// Position before token `index`, so that [`move_next`](Self::move_next)
    /// lands on it. Indexes past the end position after the last token.
    pub fn move_index(&mut self, index: usize) {
        self.position = index.min(self.count);
        self.current = None;
    }

    pub fn move_start(&mut self) {
        self.move_index(0);
    }

    pub fn move_end(&mut self) {
        self.move_index(self.count);
    }

    /// Position before the token containing the absolute `offset` and return
    /// the distance from that token's start. Offsets before the first token
    /// select it with a negative distance; offsets past the last token select
    /// it with a distance beyond its length. `None` for an empty list.
    pub fn move_to(&mut self, offset: u32) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        let index = match offset.checked_sub(self.base) {
            Some(relative) => {
                let state = self.hierarchy.read_state();
                state
                    .list(self.list)
                    .first_ending_after(relative)
                    .min(self.count - 1)
            }
            None => 0,
        };
        self.move_index(index);
        let start = self.base + self.hierarchy.read_state().list(self.list).offset(index);
        Some(i64::from(offset) - i64::from(start))
    }

    // === Current token ===

    pub fn index(&self) -> Option<usize> {
        self.current
    }

    pub fn token_count(&self) -> usize {
        self.count
    }

    pub fn token(&self) -> Option<LocatedToken> {
        self.token_at(self.current?)
    }

    /// Absolute offset of the current token, flyweights included.
    pub fn offset(&self) -> Option<u32> {
        self.offset_at(self.current?)
    }

    /// Text of the current token.
    pub fn token_text(&self) -> Option<Cow<'h, str>> {
        self.text_at(self.current?)
    }

    pub(crate) fn token_at(&self, index: usize) -> Option<LocatedToken> {
        if index >= self.count {
            return None;
        }
        let state = self.hierarchy.read_state();
        let list = state.list(self.list);
        let token = list.token(index).clone();
        let offset = (!token.is_flyweight()).then(|| self.base + list.offset(index));
        Some(LocatedToken { token, offset })
    }

    pub(crate) fn offset_at(&self, index: usize) -> Option<u32> {
        (index < self.count)
            .then(|| self.base + self.hierarchy.read_state().list(self.list).offset(index))
    }

    pub(crate) fn text_at(&self, index: usize) -> Option<Cow<'h, str>> {
        if index >= self.count {
            return None;
        }
        let state = self.hierarchy.read_state();
        let list = state.list(self.list);
        let token = list.token(index);
        match token.text_kind() {
            TokenText::Flyweight(text) => Some(Cow::Borrowed(*text)),
            TokenText::Custom(text) => Some(Cow::Owned(text.to_string())),
            TokenText::Buffer => {
                let start = self.base + list.offset(index);
                let text: &'h str = self.hierarchy.input().text();
                text.get(start as usize..(start + token.len()) as usize)
                    .map(Cow::Borrowed)
            }
        }
    }

    /// Bytes past the current token the lexer examined.
    pub fn lookahead(&self) -> Option<u32> {
        let index = self.current?;
        Some(self.hierarchy.read_state().list(self.list).entry(index).lookahead)
    }

    /// Lexer state after the current token.
    pub fn state(&self) -> Option<LexerState> {
        let index = self.current?;
        Some(self.hierarchy.read_state().list(self.list).state_after(index).clone())
    }

    // === List ===

    pub fn language(&self) -> &Language {
        self.path.inner_language()
    }

    pub fn language_path(&self) -> &LanguagePath {
        &self.path
    }

    /// Sequence over the default embedding of the current token.
    pub fn embedded(&self) -> Option<TokenSequence<'h, I>> {
        self.embedded_list(None)
    }

    /// Sequence over the embedding of `language` in the current token.
    pub fn embedded_for(&self, language: &Language) -> Option<TokenSequence<'h, I>> {
        self.embedded_list(Some(language))
    }

    fn embedded_list(&self, language: Option<&Language>) -> Option<TokenSequence<'h, I>> {
        let index = self.current?;
        let (child, base, path) = self
            .hierarchy
            .embedded_list(self.list, self.base, index, language)?;
        Some(TokenSequence::new(self.hierarchy, child, base, path))
    }
}

impl<I: MutableTextInput> std::fmt::Debug for TokenSequence<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSequence")
            .field("path", &self.path)
            .field("base", &self.base)
            .field("count", &self.count)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
