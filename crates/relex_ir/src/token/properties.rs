//! Arbitrary key/value extras attached to tokens.

use std::fmt;
use std::sync::Arc;

use super::Token;

/// Value of a token property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

/// Computes properties for the tokens it is attached to.
///
/// Providers are shared by reference count, so one provider may serve many
/// tokens; it receives the token it is asked about.
pub trait TokenPropertyProvider: Send + Sync + fmt::Debug {
    fn value(&self, token: &Token, key: &str) -> Option<PropertyValue>;
}
