//! Hierarchy tunables.

use relex_lexer_core::MAX_FLYWEIGHT_RUN;

/// Largest removed or inserted length for which a token validator is tried.
pub const VALIDATION_EDIT_LIMIT: u32 = 16;

/// Idle lexer instances kept per language.
pub const LEXER_POOL_CAPACITY: usize = 4;

/// Settings fixed at hierarchy construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Consecutive flyweight tokens before a buffer-backed token is forced.
    pub max_flyweight_run: u32,
    /// Largest removed or inserted length handed to token validators.
    pub validation_edit_limit: u32,
    pub lexer_pool_capacity: usize,
    /// Query the input's lock predicates and record violations.
    pub verify_locks: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        HierarchyConfig {
            max_flyweight_run: MAX_FLYWEIGHT_RUN,
            validation_edit_limit: VALIDATION_EDIT_LIMIT,
            lexer_pool_capacity: LEXER_POOL_CAPACITY,
            verify_locks: true,
        }
    }
}
