//! Token lists: the tokens of one language over one contiguous span.
//!
//! # Offsets
//!
//! Offsets are relative to the start of the list's content (the whole input
//! for the root list, the area between the skips for an embedded list).
//! They are not stored per token in final form. Entries below `gap_index`
//! hold their true offset; entries at or above it hold an offset that still
//! needs `gap_shift` added. A splice moves the gap to the edit and adds the
//! edit's delta to the shift, so the work per edit is proportional to the
//! distance between consecutive edits rather than to the list length.

use bitflags::bitflags;
use smallvec::SmallVec;

use relex_ir::{LexerState, Token};
use relex_lang::{EmbeddingSpec, Language, LanguagePath};

/// Index of a token list in the hierarchy arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(u32);

impl ListId {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        ListId(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Properties of a token list that do not change after creation.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ListFlags: u8 {
        /// Section of a joined chain.
        const JOINED = 1 << 0;
        /// Created explicitly rather than by embedding resolution.
        const CUSTOM = 1 << 1;
    }
}

/// Where an update of a list currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListStatus {
    #[default]
    Stable,
    Scanning,
    Splicing,
    /// The lexer malfunctioned; the list must be rebuilt from scratch.
    Broken,
}

/// Link from an embedded list to the list holding its host token.
#[derive(Clone, Debug)]
pub(crate) struct EmbeddingLink {
    pub parent: ListId,
    pub spec: EmbeddingSpec,
}

/// A token together with its incremental bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct TokenEntry {
    pub token: Token,
    /// Offset, in raw form above the gap.
    raw: i64,
    /// Bytes of skipped tokens between the previous token and this one.
    pub skipped_before: u32,
    /// Bytes past the token end the lexer examined.
    pub lookahead: u32,
    /// Lexer state after this token.
    pub state: LexerState,
    /// Embedded lists hosted by this token.
    pub embeddings: SmallVec<[ListId; 1]>,
}

/// A freshly lexed token, offsets in final form.
#[derive(Clone, Debug)]
pub(crate) struct LexedEntry {
    pub token: Token,
    pub offset: u32,
    pub skipped_before: u32,
    pub lookahead: u32,
    pub state: LexerState,
    /// Flyweight run after this token.
    pub flyweight_run: u32,
}

impl LexedEntry {
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.token.len()
    }
}

/// An entry removed by a splice, with its offset before the edit.
#[derive(Debug)]
pub(crate) struct RemovedEntry {
    pub offset: u32,
    pub entry: TokenEntry,
}

impl RemovedEntry {
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.entry.token.len()
    }
}

#[derive(Debug)]
pub(crate) struct TokenList {
    pub path: LanguagePath,
    entries: Vec<TokenEntry>,
    gap_index: usize,
    gap_shift: i64,
    /// Length of the covered content.
    text_len: u32,
    /// Skipped bytes after the last token.
    trailing_skip: u32,
    /// Largest lookahead any token of this list ever had.
    max_lookahead: u32,
    /// State the lexer starts in at offset zero.
    pub start_state: LexerState,
    pub link: Option<EmbeddingLink>,
    pub flags: ListFlags,
    pub status: ListStatus,
    /// Languages whose joined chains are hosted by tokens of this list.
    pub joined: SmallVec<[Language; 1]>,
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "true offsets are non-negative and bounded by the u32 text length"
)]
#[inline]
fn to_offset(value: i64) -> u32 {
    value as u32
}

impl TokenList {
    pub fn new(
        path: LanguagePath,
        start_state: LexerState,
        link: Option<EmbeddingLink>,
        flags: ListFlags,
    ) -> Self {
        TokenList {
            path,
            entries: Vec::new(),
            gap_index: 0,
            gap_shift: 0,
            text_len: 0,
            trailing_skip: 0,
            max_lookahead: 0,
            start_state,
            link,
            flags,
            status: ListStatus::Stable,
            joined: SmallVec::new(),
        }
    }

    /// Fill an empty list with the result of a full lexing run.
    pub fn fill(&mut self, lexed: Vec<LexedEntry>, trailing_skip: u32, text_len: u32) {
        debug_assert!(self.entries.is_empty(), "fill expects an empty list");
        self.max_lookahead = lexed.iter().map(|e| e.lookahead).max().unwrap_or(0);
        self.entries = lexed.into_iter().map(TokenEntry::from).collect();
        self.gap_index = self.entries.len();
        self.gap_shift = 0;
        self.trailing_skip = trailing_skip;
        self.text_len = text_len;
    }

    // === Queries ===

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn text_len(&self) -> u32 {
        self.text_len
    }

    #[inline]
    pub fn trailing_skip(&self) -> u32 {
        self.trailing_skip
    }

    #[inline]
    pub fn entry(&self, index: usize) -> &TokenEntry {
        &self.entries[index]
    }

    #[inline]
    pub fn entry_mut(&mut self, index: usize) -> &mut TokenEntry {
        &mut self.entries[index]
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &TokenEntry)> {
        self.entries.iter().enumerate()
    }

    #[inline]
    pub fn token(&self, index: usize) -> &Token {
        &self.entries[index].token
    }

    /// Offset of a token's first byte.
    #[inline]
    pub fn offset(&self, index: usize) -> u32 {
        let raw = self.entries[index].raw;
        if index < self.gap_index {
            to_offset(raw)
        } else {
            to_offset(raw + self.gap_shift)
        }
    }

    /// Offset one past a token's last byte.
    #[inline]
    pub fn end(&self, index: usize) -> u32 {
        self.offset(index) + self.entries[index].token.len()
    }

    /// Lexer state after the token at `index`.
    #[inline]
    pub fn state_after(&self, index: usize) -> &LexerState {
        &self.entries[index].state
    }

    /// State after the last token; the start state for an empty list.
    pub fn end_state(&self) -> &LexerState {
        self.entries
            .last()
            .map_or(&self.start_state, |entry| &entry.state)
    }

    /// Number of flyweight tokens immediately before `index`.
    pub fn flyweight_run_before(&self, index: usize) -> u32 {
        let run = self.entries[..index]
            .iter()
            .rev()
            .take_while(|entry| entry.token.is_flyweight())
            .count();
        u32::try_from(run).unwrap_or(u32::MAX)
    }

    /// Index of the first token ending after `offset`; `len()` if none.
    pub fn first_ending_after(&self, offset: u32) -> usize {
        let (mut low, mut high) = (0, self.entries.len());
        while low < high {
            let mid = low + (high - low) / 2;
            if self.end(mid) > offset {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }

    /// Index of the token containing `offset`. Offsets in a skipped gap
    /// resolve to the following token.
    pub fn token_index_at(&self, offset: u32) -> Option<usize> {
        let index = self.first_ending_after(offset);
        (index < self.entries.len()).then_some(index)
    }

    /// First token that must be relexed for an edit starting at `offset`,
    /// given that `anchor` is the first token ending after it.
    ///
    /// A token is relexed when its lookahead reaches the edit. Tokens whose
    /// end plus the list's maximum lookahead stays at or before `offset`
    /// cannot, which bounds the backward walk.
    pub fn relex_start(&self, anchor: usize, offset: u32) -> usize {
        let mut start = anchor;
        let mut index = anchor;
        while index > 0 {
            index -= 1;
            let end = self.end(index);
            if end.saturating_add(self.max_lookahead) <= offset {
                break;
            }
            if end + self.entries[index].lookahead > offset {
                start = index;
            }
        }
        start
    }

    // === Mutation ===

    /// Replace the entries in `range` with `added` and shift every later
    /// entry by `delta`. `trailing_skip` replaces the skip after the last
    /// token when the run reached the end of the content.
    ///
    /// Returns the removed entries with their offsets before the edit.
    pub fn splice(
        &mut self,
        range: std::ops::Range<usize>,
        added: Vec<LexedEntry>,
        delta: i64,
        trailing_skip: Option<u32>,
    ) -> Vec<RemovedEntry> {
        self.move_gap(range.start);
        let shift = self.gap_shift;
        let added_len = added.len();
        if let Some(max) = added.iter().map(|e| e.lookahead).max() {
            self.max_lookahead = self.max_lookahead.max(max);
        }
        let removed = self
            .entries
            .splice(range.clone(), added.into_iter().map(TokenEntry::from))
            .map(|entry| RemovedEntry {
                offset: to_offset(entry.raw + shift),
                entry,
            })
            .collect();
        self.gap_index = range.start + added_len;
        self.gap_shift += delta;
        self.text_len = to_offset(i64::from(self.text_len) + delta);
        if let Some(skip) = trailing_skip {
            self.trailing_skip = skip;
        }
        removed
    }

    /// Replace one entry in place, keeping its bookkeeping.
    pub fn replace_token(&mut self, index: usize, token: Token, delta: i64) -> RemovedEntry {
        let offset = self.offset(index);
        let entry = &self.entries[index];
        let replacement = LexedEntry {
            token,
            offset,
            skipped_before: entry.skipped_before,
            lookahead: entry.lookahead,
            state: entry.state.clone(),
            flyweight_run: 0,
        };
        let mut removed = self.splice(index..index + 1, vec![replacement], delta, None);
        // One entry in, one entry out.
        removed.swap_remove(0)
    }

    /// Drop all entries, returning them for teardown of their embeddings.
    pub fn clear(&mut self) -> Vec<TokenEntry> {
        self.gap_index = 0;
        self.gap_shift = 0;
        self.trailing_skip = 0;
        self.text_len = 0;
        std::mem::take(&mut self.entries)
    }

    fn move_gap(&mut self, to: usize) {
        let shift = self.gap_shift;
        if shift == 0 {
            self.gap_index = to;
            return;
        }
        if to < self.gap_index {
            for entry in &mut self.entries[to..self.gap_index] {
                entry.raw -= shift;
            }
        } else {
            for entry in &mut self.entries[self.gap_index..to] {
                entry.raw += shift;
            }
        }
        self.gap_index = to;
    }
}

impl From<LexedEntry> for TokenEntry {
    fn from(lexed: LexedEntry) -> Self {
        TokenEntry {
            token: lexed.token,
            raw: i64::from(lexed.offset),
            skipped_before: lexed.skipped_before,
            lookahead: lexed.lookahead,
            state: lexed.state,
            embeddings: SmallVec::new(),
        }
    }
}
