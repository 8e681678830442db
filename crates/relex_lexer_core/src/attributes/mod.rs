//! Input attributes: per-language-path settings supplied by the input owner.

use rustc_hash::FxHashMap;

use relex_ir::TokenIdSet;

/// Value stored under an attribute key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(Box<str>),
    TokenIds(TokenIdSet),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_token_ids(&self) -> Option<&TokenIdSet> {
        match self {
            AttributeValue::TokenIds(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Attribute bag keyed by language-path mime path.
///
/// Values set with an empty mime path apply to every language path that
/// does not set the key itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputAttributes {
    paths: FxHashMap<Box<str>, FxHashMap<Box<str>, AttributeValue>>,
}

impl InputAttributes {
    /// Token ids the lexer must report as skipped rather than store.
    pub const SKIP_TOKEN_IDS: &'static str = "skip-token-ids";

    pub fn new() -> Self {
        InputAttributes::default()
    }

    /// Set `key` for the language path with the given mime path.
    pub fn set(&mut self, mime_path: &str, key: &str, value: AttributeValue) {
        self.paths
            .entry(Box::from(mime_path))
            .or_default()
            .insert(Box::from(key), value);
    }

    /// Set `key` for every language path.
    pub fn set_global(&mut self, key: &str, value: AttributeValue) {
        self.set("", key, value);
    }

    /// Remove `key` from one language path. Returns the previous value.
    pub fn remove(&mut self, mime_path: &str, key: &str) -> Option<AttributeValue> {
        self.paths.get_mut(mime_path)?.remove(key)
    }

    /// Look up `key`, falling back to the global value.
    pub fn get(&self, mime_path: &str, key: &str) -> Option<&AttributeValue> {
        self.paths
            .get(mime_path)
            .and_then(|values| values.get(key))
            .or_else(|| self.paths.get("").and_then(|values| values.get(key)))
    }

    /// Skip set for a language path.
    pub fn skip_token_ids(&self, mime_path: &str) -> Option<&TokenIdSet> {
        self.get(mime_path, Self::SKIP_TOKEN_IDS)
            .and_then(AttributeValue::as_token_ids)
            .filter(|ids| !ids.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.paths.values().all(FxHashMap::is_empty)
    }
}
