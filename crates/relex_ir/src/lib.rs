//! relex IR - value types shared by every layer of the engine
//!
//! This crate contains the data the lexing engine moves around:
//! - Spans and text changes over the input buffer
//! - Token ids, token id sets, and part types
//! - Tokens with their text representation and optional properties
//! - Opaque lexer restart states
//!
//! # Design Philosophy
//!
//! - **Values, not graphs**: a [`Token`] never points back at the list that
//!   owns it. Its offset is a function of where it sits, so tokens stay
//!   immutable and cheap to clone.
//! - **No allocation for common cases**: default and small-integer lexer
//!   states, flyweight texts, and buffer-backed texts are all inline.
//! - **Byte offsets**: every offset and length is a `u32` byte count into
//!   UTF-8 text.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod incremental;
mod span;
mod state;
mod token;

pub use span::Span;
pub use state::LexerState;
pub use token::{
    PartType, PropertyValue, Token, TokenId, TokenIdSet, TokenPropertyProvider, TokenText,
};
