//! Languages: token-id universe, lexer factory, embedding and validator hooks.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use relex_ir::{TokenId, TokenIdSet};
use relex_lexer_core::{Lexer, LexerRestartInfo};

use crate::embedding::{EmbeddingPresence, EmbeddingQuery, EmbeddingSpec};
use crate::validator::TokenValidator;

/// Per-language definition, implemented once for every supported language.
pub trait LanguageHierarchy: Send + Sync + 'static {
    /// Mime type identifying the language, e.g. `text/x-calc`.
    fn mime_type(&self) -> &'static str;

    /// Every token id of the language. Ordinals must be dense and unique.
    fn token_ids(&self) -> Vec<TokenId>;

    /// Extra category memberships beyond each id's primary category.
    fn token_categories(&self) -> Vec<(&'static str, Vec<TokenId>)> {
        Vec::new()
    }

    /// Lexer instance ready to scan from the state in `info`.
    fn create_lexer(&self, info: &LexerRestartInfo<'_>) -> Box<dyn Lexer>;

    /// Language embedded in a token, if any. Consulted before the provider
    /// chain.
    fn embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        let _ = query;
        None
    }

    /// How embedding decisions for tokens with `id` may be cached.
    fn embedding_presence(&self, id: TokenId) -> EmbeddingPresence {
        let _ = id;
        EmbeddingPresence::CachedFirstQuery
    }

    /// Fast-path validator for tokens with `id`.
    fn validator(&self, id: TokenId) -> Option<Arc<dyn TokenValidator>> {
        let _ = id;
        None
    }
}

/// Errors raised while building a [`Language`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("language `{mime_type}` declares no token ids")]
    NoTokenIds { mime_type: &'static str },
    #[error(
        "token ids of `{mime_type}` are not dense and unique: `{name}` has ordinal {ordinal}, expected {expected}"
    )]
    InvalidTokenIds {
        mime_type: &'static str,
        name: &'static str,
        ordinal: u16,
        expected: u16,
    },
    #[error("token id name `{name}` is declared twice in `{mime_type}`")]
    DuplicateTokenName {
        mime_type: &'static str,
        name: &'static str,
    },
}

/// Process-unique language identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(u32);

impl LanguageId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        LanguageId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Shared handle to a language.
///
/// Cloning is a reference-count bump. Two handles are equal iff they were
/// cloned from the same [`Language::new`] call.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

struct LanguageInner {
    id: LanguageId,
    mime_type: &'static str,
    hierarchy: Box<dyn LanguageHierarchy>,
    /// Indexed by ordinal.
    ids: Vec<TokenId>,
    by_name: FxHashMap<&'static str, TokenId>,
    categories: FxHashMap<&'static str, TokenIdSet>,
    /// Indexed by ordinal.
    presence: Vec<EmbeddingPresence>,
    /// Indexed by ordinal.
    validators: Vec<Option<Arc<dyn TokenValidator>>>,
}

impl Language {
    /// Build a language, validating its token-id table.
    pub fn new(hierarchy: impl LanguageHierarchy) -> Result<Language, LanguageError> {
        let mime_type = hierarchy.mime_type();
        let mut ids = hierarchy.token_ids();
        if ids.is_empty() {
            return Err(LanguageError::NoTokenIds { mime_type });
        }
        ids.sort_by_key(TokenId::ordinal);

        let mut by_name = FxHashMap::default();
        let mut categories: FxHashMap<&'static str, TokenIdSet> = FxHashMap::default();
        for (index, id) in ids.iter().enumerate() {
            let expected = u16::try_from(index).unwrap_or(u16::MAX);
            if id.ordinal() != expected {
                return Err(LanguageError::InvalidTokenIds {
                    mime_type,
                    name: id.name(),
                    ordinal: id.ordinal(),
                    expected,
                });
            }
            if by_name.insert(id.name(), *id).is_some() {
                return Err(LanguageError::DuplicateTokenName {
                    mime_type,
                    name: id.name(),
                });
            }
            if let Some(category) = id.primary_category() {
                categories.entry(category).or_default().insert(*id);
            }
        }
        for (category, members) in hierarchy.token_categories() {
            categories.entry(category).or_default().extend(members);
        }

        let presence = ids
            .iter()
            .map(|id| hierarchy.embedding_presence(*id))
            .collect();
        let validators = ids.iter().map(|id| hierarchy.validator(*id)).collect();

        let id = LanguageId::next();
        tracing::debug!(mime_type, id = id.raw(), token_ids = ids.len(), "language created");
        Ok(Language {
            inner: Arc::new(LanguageInner {
                id,
                mime_type,
                hierarchy: Box::new(hierarchy),
                ids,
                by_name,
                categories,
                presence,
                validators,
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> LanguageId {
        self.inner.id
    }

    #[inline]
    pub fn mime_type(&self) -> &'static str {
        self.inner.mime_type
    }

    /// All token ids, ordered by ordinal.
    pub fn token_ids(&self) -> &[TokenId] {
        &self.inner.ids
    }

    pub fn token_id(&self, name: &str) -> Option<TokenId> {
        self.inner.by_name.get(name).copied()
    }

    pub fn token_id_by_ordinal(&self, ordinal: u16) -> Option<TokenId> {
        self.inner.ids.get(usize::from(ordinal)).copied()
    }

    pub fn max_ordinal(&self) -> u16 {
        u16::try_from(self.inner.ids.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }

    /// Every category `id` belongs to, primary category first.
    pub fn token_categories(&self, id: TokenId) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = id.primary_category().into_iter().collect();
        let mut extra: Vec<&'static str> = self
            .inner
            .categories
            .iter()
            .filter(|(name, members)| Some(**name) != id.primary_category() && members.contains(id))
            .map(|(name, _)| *name)
            .collect();
        extra.sort_unstable();
        names.extend(extra);
        names
    }

    pub fn token_category_members(&self, category: &str) -> Option<&TokenIdSet> {
        self.inner.categories.get(category)
    }

    pub fn create_lexer(&self, info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        self.inner.hierarchy.create_lexer(info)
    }

    pub fn embedding_presence(&self, id: TokenId) -> EmbeddingPresence {
        self.inner
            .presence
            .get(usize::from(id.ordinal()))
            .copied()
            .unwrap_or_default()
    }

    pub fn validator(&self, id: TokenId) -> Option<&Arc<dyn TokenValidator>> {
        self.inner
            .validators
            .get(usize::from(id.ordinal()))
            .and_then(Option::as_ref)
    }

    /// The hierarchy's own embedding hook.
    pub(crate) fn hierarchy_embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        self.inner.hierarchy.embedding(query)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.inner.mime_type)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.mime_type)
    }
}
