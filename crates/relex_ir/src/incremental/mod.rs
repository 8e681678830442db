//! Text modification descriptors.
//!
//! A [`TextChange`] describes one edit of the input buffer: the region
//! `[start, old_end)` of the old text was replaced by `new_len` bytes. The
//! owner of the mutable text reports every edit this way, and the engine
//! threads it through relexing and change events.

use crate::Span;

/// A single text edit against the old text.
///
/// # Examples
///
/// ```
/// use relex_ir::incremental::TextChange;
///
/// // Insert "hello" at position 10
/// let insert = TextChange::insert(10, 5);
/// assert_eq!(insert.delta(), 5);
///
/// // Delete 3 bytes starting at position 5
/// let delete = TextChange::delete(5, 3);
/// assert_eq!(delete.delta(), -3);
///
/// // Replace "foo" (3 bytes) with "hello" (5 bytes) at position 0
/// let replace = TextChange::replace(0, 3, 5);
/// assert_eq!(replace.delta(), 2);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextChange {
    /// Start byte offset in old text.
    pub start: u32,
    /// End byte offset in old text (exclusive).
    pub old_end: u32,
    /// Length of replacement text in bytes.
    pub new_len: u32,
}

impl TextChange {
    /// Create a new text change.
    #[inline]
    pub const fn new(start: u32, old_end: u32, new_len: u32) -> Self {
        TextChange {
            start,
            old_end,
            new_len,
        }
    }

    /// Create an insertion (nothing removed).
    #[inline]
    pub const fn insert(at: u32, len: u32) -> Self {
        TextChange {
            start: at,
            old_end: at,
            new_len: len,
        }
    }

    /// Create a deletion (nothing inserted).
    #[inline]
    pub const fn delete(start: u32, len: u32) -> Self {
        TextChange {
            start,
            old_end: start + len,
            new_len: 0,
        }
    }

    /// Create a replacement.
    #[inline]
    pub const fn replace(start: u32, old_len: u32, new_len: u32) -> Self {
        TextChange {
            start,
            old_end: start + old_len,
            new_len,
        }
    }

    /// Net change in document length (positive = grew, negative = shrank).
    #[inline]
    pub fn delta(&self) -> i64 {
        i64::from(self.new_len) - i64::from(self.old_end - self.start)
    }

    /// Length of the removed region in the old text.
    #[inline]
    pub const fn old_len(&self) -> u32 {
        self.old_end - self.start
    }

    /// New end position after the change is applied.
    #[inline]
    pub const fn new_end(&self) -> u32 {
        self.start + self.new_len
    }

    /// `true` when the change neither removes nor inserts anything.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.old_end && self.new_len == 0
    }

    /// The removed region in old-text coordinates.
    #[inline]
    pub const fn old_span(&self) -> Span {
        Span::new(self.start, self.old_end)
    }

    /// The inserted region in new-text coordinates.
    #[inline]
    pub const fn new_span(&self) -> Span {
        Span::new(self.start, self.new_end())
    }

    /// `span` ends at or before the removed region, so the edit leaves it
    /// in place.
    #[inline]
    pub fn keeps_before(&self, span: Span) -> bool {
        span.end <= self.start
    }

    /// `span` starts at or after the removed region, so the edit only moves
    /// it by [`delta`](Self::delta).
    #[inline]
    pub fn keeps_after(&self, span: Span) -> bool {
        span.start >= self.old_end
    }

    /// Check that the change fits a document that was `old_len` bytes long
    /// and is `new_len` bytes long now.
    #[inline]
    pub fn fits(&self, old_len: u32, new_len: u32) -> bool {
        self.start <= self.old_end
            && self.old_end <= old_len
            && i64::from(old_len) + self.delta() == i64::from(new_len)
    }

    /// New-text position of an old-text offset at or after the removed
    /// region. `None` for offsets inside or before it.
    #[inline]
    pub fn moved_offset(&self, pos: u32) -> Option<u32> {
        if pos < self.old_end {
            return None;
        }
        u32::try_from(i64::from(pos) + self.delta()).ok()
    }

    /// Translate the change into the coordinates of a sub-region starting at
    /// `base` (e.g. the content of an embedded token list).
    #[inline]
    #[must_use]
    pub const fn relative_to(self, base: u32) -> TextChange {
        TextChange {
            start: self.start - base,
            old_end: self.old_end - base,
            new_len: self.new_len,
        }
    }
}
