//! Opaque lexer restart state.
//!
//! The engine records the state a lexer reports after every token and hands
//! it back when relexing resumes at that token boundary. It never looks
//! inside; it only compares states for equality to decide where a relex may
//! stop.

use std::sync::Arc;

/// State a lexer can be restarted from.
///
/// `Default` and `Small` are stored inline so the common case (a plain
/// integer mode, or no state at all) costs no allocation per token.
/// `Words` carries compound states such as nesting stacks.
///
/// Constructors normalize, so a given logical state has exactly one
/// representation and derived equality is structural equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LexerState {
    /// The lexer's initial state.
    #[default]
    Default,
    /// A single-word state.
    Small(u32),
    /// A multi-word state.
    Words(Arc<[u32]>),
}

const _: () = assert!(std::mem::size_of::<LexerState>() <= 24);

impl LexerState {
    /// Single-word state.
    #[inline]
    pub const fn small(value: u32) -> Self {
        LexerState::Small(value)
    }

    /// State built from a word slice.
    ///
    /// An empty slice is the default state and a one-word slice is a small
    /// state; only longer slices allocate.
    pub fn words(words: &[u32]) -> Self {
        match words {
            [] => LexerState::Default,
            [single] => LexerState::Small(*single),
            _ => LexerState::Words(Arc::from(words)),
        }
    }

    /// `true` for the lexer's initial state.
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, LexerState::Default)
    }

    /// The single word of a small state.
    #[inline]
    pub fn as_small(&self) -> Option<u32> {
        match self {
            LexerState::Small(value) => Some(*value),
            _ => None,
        }
    }

    /// All words of the state; empty for the default state.
    pub fn as_words(&self) -> &[u32] {
        match self {
            LexerState::Default => &[],
            LexerState::Small(value) => std::slice::from_ref(value),
            LexerState::Words(words) => words,
        }
    }
}

impl From<u32> for LexerState {
    fn from(value: u32) -> Self {
        LexerState::Small(value)
    }
}

impl From<Option<u32>> for LexerState {
    fn from(value: Option<u32>) -> Self {
        value.map_or(LexerState::Default, LexerState::Small)
    }
}
