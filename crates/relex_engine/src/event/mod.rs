//! Change events delivered to hierarchy listeners.

use relex_ir::incremental::TextChange;
use relex_ir::{Span, Token};
use relex_lang::LanguagePath;

/// What caused an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenHierarchyEventKind {
    Modification,
    Rebuild,
    Activity,
    EmbeddingCreated,
    EmbeddingRemoved,
    EmbeddingsInvalidated,
}

/// Tokens replaced in one token list.
///
/// Offsets are absolute. `offset..removed_end` is the replaced range in the
/// text before the modification, `offset..added_end` the range in the text
/// after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenListChange {
    pub path: LanguagePath,
    /// Index of the first replaced token.
    pub index: usize,
    pub offset: u32,
    pub removed: Vec<Token>,
    pub added: Vec<Token>,
    pub removed_end: u32,
    pub added_end: u32,
    /// The list's host token changed length and the list was updated in
    /// place instead of being recreated.
    pub bounds_change: bool,
}

impl TokenListChange {
    /// `true` if the change neither removed nor added tokens.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// The replaced tokens' range in the old text.
    pub fn removed_span(&self) -> Span {
        Span::new(self.offset, self.removed_end)
    }

    /// The added tokens' range in the new text.
    pub fn added_span(&self) -> Span {
        Span::new(self.offset, self.added_end)
    }
}

/// One hierarchy change, with every affected list in discovery order: the
/// root list first, then embedded lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHierarchyEvent {
    pub kind: TokenHierarchyEventKind,
    /// The text edit, for modification events.
    pub modification: Option<TextChange>,
    pub changes: Vec<TokenListChange>,
    /// New-text range covering every change, or the inserted text when no
    /// token changed.
    pub affected: Span,
    /// Joined sections relexed because the state they start in changed.
    pub join_cascades: u32,
}

impl TokenHierarchyEvent {
    pub(crate) fn new(
        kind: TokenHierarchyEventKind,
        modification: Option<TextChange>,
        changes: Vec<TokenListChange>,
        join_cascades: u32,
    ) -> Self {
        let affected = changes
            .iter()
            .map(TokenListChange::added_span)
            .reduce(Span::cover)
            .or_else(|| modification.map(|m| m.new_span()))
            .unwrap_or(Span::EMPTY);
        TokenHierarchyEvent {
            kind,
            modification,
            changes,
            affected,
            join_cascades,
        }
    }

    /// Whole-hierarchy event without per-list detail.
    pub(crate) fn global(kind: TokenHierarchyEventKind, text_len: u32) -> Self {
        TokenHierarchyEvent {
            kind,
            modification: None,
            changes: Vec::new(),
            affected: Span::new(0, text_len),
            join_cascades: 0,
        }
    }

    /// Change records for one language path.
    pub fn changes_for<'a>(
        &'a self,
        path: &'a LanguagePath,
    ) -> impl Iterator<Item = &'a TokenListChange> + 'a {
        self.changes.iter().filter(move |change| &change.path == path)
    }
}

/// Receives hierarchy events synchronously, after the change is complete.
pub trait TokenHierarchyListener: Send + Sync {
    fn token_hierarchy_changed(&self, event: &TokenHierarchyEvent);
}
