//! Tokens produced by lexers and stored by token lists.
//!
//! A [`Token`] is an immutable value: id, length, part type, how its text is
//! represented, and optional extra properties. It carries no offset. The
//! list that owns it knows where it sits, and flyweight tokens report no
//! offset at all because the same text may occur anywhere.

mod id;
mod properties;

use std::fmt;
use std::sync::Arc;

pub use id::{TokenId, TokenIdSet};
pub use properties::{PropertyValue, TokenPropertyProvider};

/// How much of a lexical construct a token covers.
///
/// Lexers emit `Start` for a construct cut off by the end of input (an
/// unterminated block comment), and `Middle`/`End` when a construct continues
/// across joined embedded sections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartType {
    #[default]
    Complete,
    Start,
    Middle,
    End,
}

impl PartType {
    #[inline]
    pub const fn is_complete(self) -> bool {
        matches!(self, PartType::Complete)
    }
}

/// Where a token's text comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenText {
    /// The text is the input region the token covers.
    Buffer,
    /// Shared, state-independent text (operators, keywords). Tokens with this
    /// text are flyweights and have no individual offset.
    Flyweight(&'static str),
    /// Text that differs from the covered input region.
    Custom(Arc<str>),
}

/// A lexical unit.
#[derive(Clone)]
pub struct Token {
    id: TokenId,
    len: u32,
    part: PartType,
    text: TokenText,
    properties: Option<Arc<dyn TokenPropertyProvider>>,
}

impl Token {
    /// Complete token whose text is the covered input.
    #[inline]
    pub fn new(id: TokenId, len: u32) -> Self {
        Token::with_part(id, len, PartType::Complete)
    }

    /// Token whose text is the covered input, with an explicit part type.
    #[inline]
    pub fn with_part(id: TokenId, len: u32, part: PartType) -> Self {
        Token {
            id,
            len,
            part,
            text: TokenText::Buffer,
            properties: None,
        }
    }

    /// Flyweight token; its length is the length of `text`.
    pub fn flyweight(id: TokenId, text: &'static str) -> Self {
        Token {
            id,
            len: u32::try_from(text.len()).unwrap_or(u32::MAX),
            part: PartType::Complete,
            text: TokenText::Flyweight(text),
            properties: None,
        }
    }

    /// Token covering `len` input bytes but presenting `text`.
    pub fn custom_text(id: TokenId, len: u32, part: PartType, text: Arc<str>) -> Self {
        Token {
            id,
            len,
            part,
            text: TokenText::Custom(text),
            properties: None,
        }
    }

    /// Token with a property provider.
    pub fn with_properties(
        id: TokenId,
        len: u32,
        part: PartType,
        provider: Arc<dyn TokenPropertyProvider>,
    ) -> Self {
        Token {
            id,
            len,
            part,
            text: TokenText::Buffer,
            properties: Some(provider),
        }
    }

    #[inline]
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Number of input bytes the token covers (always at least one).
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Always `false` for tokens accepted by a token list.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn part(&self) -> PartType {
        self.part
    }

    #[inline]
    pub fn text_kind(&self) -> &TokenText {
        &self.text
    }

    #[inline]
    pub fn is_flyweight(&self) -> bool {
        matches!(self.text, TokenText::Flyweight(_))
    }

    #[inline]
    pub fn has_custom_text(&self) -> bool {
        matches!(self.text, TokenText::Custom(_))
    }

    /// Text carried by the token itself, if any. Buffer-backed tokens return
    /// `None`; their text lives in the input.
    pub fn own_text(&self) -> Option<&str> {
        match &self.text {
            TokenText::Buffer => None,
            TokenText::Flyweight(text) => Some(text),
            TokenText::Custom(text) => Some(text),
        }
    }

    #[inline]
    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    /// Look up an extra property.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        self.properties
            .as_ref()
            .and_then(|provider| provider.value(self, key))
    }

    /// Same token with a different length, for validators that patch a
    /// token in place. Flyweight and custom texts cannot follow a length
    /// change, so the copy is always buffer-backed.
    #[must_use]
    pub fn with_len(&self, len: u32) -> Token {
        Token {
            id: self.id,
            len,
            part: self.part,
            text: TokenText::Buffer,
            properties: self.properties.clone(),
        }
    }

    /// Same token with a different id.
    #[must_use]
    pub fn with_id(mut self, id: TokenId) -> Token {
        self.id = id;
        self
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.len == other.len
            && self.part == other.part
            && self.text == other.text
            && match (&self.properties, &other.properties) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} len={}", self.id, self.len)?;
        if !self.part.is_complete() {
            write!(f, " {:?}", self.part)?;
        }
        match &self.text {
            TokenText::Buffer => {}
            TokenText::Flyweight(text) => write!(f, " fly={text:?}")?,
            TokenText::Custom(text) => write!(f, " custom={text:?}")?,
        }
        if self.properties.is_some() {
            f.write_str(" +props")?;
        }
        Ok(())
    }
}
