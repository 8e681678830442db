//! Incremental token hierarchy.
//!
//! A [`TokenHierarchy`] keeps the tokens of a mutable input up to date:
//! the root language's tokens plus the tokens of every language embedded
//! in them. After each edit only the tokens whose lexing could have changed
//! are relexed; the result is always identical to lexing the new text from
//! scratch.
//!
//! # Key Types
//!
//! - [`TokenHierarchy`]: owner of the input and all token lists
//! - [`TokenSequence`]: cursor over one token list
//! - [`JoinedTokenSequence`]: cursor over joined sections, part tokens merged
//! - [`TokenHierarchyEvent`]: what one modification changed, per list
//! - [`MutableTextInput`]: what the hierarchy needs from its input
//! - [`ConsistencyDiagnostic`]: first broken invariant found by
//!   [`TokenHierarchy::check_consistency`]

mod config;
mod consistency;
mod error;
mod event;
mod hierarchy;
mod input;
mod lexing;
mod list;
mod sequence;
mod update;

#[cfg(test)]
mod test_support;

pub use config::{HierarchyConfig, LEXER_POOL_CAPACITY, VALIDATION_EDIT_LIMIT};
pub use consistency::{ConsistencyDiagnostic, DiagnosticKind};
pub use error::TokenHierarchyError;
pub use event::{
    TokenHierarchyEvent, TokenHierarchyEventKind, TokenHierarchyListener, TokenListChange,
};
pub use hierarchy::{SnapshotRow, TokenHierarchy};
pub use input::{MutableTextInput, TextDocument};
pub use relex_lexer_core::MAX_FLYWEIGHT_RUN;
pub use sequence::{JoinedToken, JoinedTokenSequence, LocatedToken, TokenSequence};
