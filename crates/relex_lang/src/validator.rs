//! Token validators: patch a token after a small edit inside it without
//! running the lexer.

use relex_ir::Token;

/// A modification strictly inside one token.
#[derive(Clone, Copy, Debug)]
pub struct ValidationEdit<'a> {
    /// Token before the edit.
    pub token: &'a Token,
    /// Text the token covers after the edit.
    pub text: &'a str,
    /// Edit offset relative to the token start.
    pub offset: u32,
    pub removed: u32,
    pub inserted: u32,
}

impl ValidationEdit<'_> {
    /// Token length after the edit.
    pub fn new_len(&self) -> u32 {
        self.token.len() - self.removed + self.inserted
    }
}

/// Fast-path hook registered per token id.
pub trait TokenValidator: Send + Sync {
    /// Replacement token covering exactly the edited text, or `None` to
    /// fall back to relexing.
    ///
    /// The replacement inherits the lookahead and restart state recorded for
    /// the original token, so a validator must only accept edits after which
    /// a fresh lexer run would reach the same state.
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token>;
}
