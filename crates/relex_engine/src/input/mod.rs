//! The mutable text a token hierarchy is built over.

use relex_ir::incremental::TextChange;
use relex_lexer_core::InputAttributes;

/// Text owned outside the engine.
///
/// The owner serializes access with its own reader/writer lock and reports
/// every edit through [`TokenHierarchy::text_modified`](crate::TokenHierarchy::text_modified).
/// The lock predicates are only consulted for diagnostics.
pub trait MutableTextInput {
    fn text(&self) -> &str;

    fn input_attributes(&self) -> Option<&InputAttributes> {
        None
    }

    fn is_read_locked(&self) -> bool {
        true
    }

    fn is_write_locked(&self) -> bool {
        true
    }
}

/// A `String`-backed input, always considered locked by its sole owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    attributes: Option<InputAttributes>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        TextDocument {
            text: text.into(),
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: InputAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Replace `remove_len` bytes at `offset` with `text`.
    ///
    /// Returns `None` when the range is out of bounds or splits a char.
    pub fn replace(&mut self, offset: u32, remove_len: u32, text: &str) -> Option<TextChange> {
        let start = offset as usize;
        let end = start.checked_add(remove_len as usize)?;
        if end > self.text.len()
            || !self.text.is_char_boundary(start)
            || !self.text.is_char_boundary(end)
        {
            return None;
        }
        let inserted = u32::try_from(text.len()).ok()?;
        self.text.replace_range(start..end, text);
        Some(TextChange::replace(offset, remove_len, inserted))
    }
}

impl MutableTextInput for TextDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn input_attributes(&self) -> Option<&InputAttributes> {
        self.attributes.as_ref()
    }
}

#[cfg(test)]
mod tests;
