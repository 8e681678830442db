//! Language provider chain.
//!
//! Providers map mime types to languages and may supply embeddings that a
//! language's own hierarchy does not declare. The chain is passed
//! explicitly to the engine; registering a provider bumps its generation
//! so cached embedding decisions made against the old chain are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::embedding::{EmbeddingQuery, EmbeddingSpec};
use crate::language::Language;

/// Source of languages and embeddings.
pub trait LanguageProvider: Send + Sync {
    fn find_language(&self, mime_type: &str) -> Option<Language>;

    fn find_embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        let _ = query;
        None
    }

    /// `true` if [`find_embedding`](Self::find_embedding) depends only on
    /// the token id and language path, so its answers may be cached per id.
    fn is_id_invariant(&self) -> bool {
        false
    }
}

/// Provider serving a fixed set of languages.
#[derive(Clone, Debug, Default)]
pub struct LanguageSet {
    languages: Vec<Language>,
}

impl LanguageSet {
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Self {
        LanguageSet {
            languages: languages.into_iter().collect(),
        }
    }
}

impl LanguageProvider for LanguageSet {
    fn find_language(&self, mime_type: &str) -> Option<Language> {
        self.languages
            .iter()
            .find(|language| language.mime_type() == mime_type)
            .cloned()
    }

    fn is_id_invariant(&self) -> bool {
        true
    }
}

/// Answer of the provider chain to an embedding query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEmbedding {
    pub spec: Option<EmbeddingSpec>,
    /// The answer may be cached per token id.
    pub cacheable: bool,
}

/// Ordered chain of providers.
#[derive(Default)]
pub struct LanguageProviders {
    providers: RwLock<Vec<Arc<dyn LanguageProvider>>>,
    generation: AtomicU64,
    by_mime: DashMap<Box<str>, Option<Language>>,
}

impl LanguageProviders {
    pub fn new() -> Self {
        LanguageProviders::default()
    }

    /// Append a provider. Earlier providers win.
    pub fn register(&self, provider: Arc<dyn LanguageProvider>) {
        self.providers.write().push(provider);
        self.invalidate();
    }

    /// Drop memoized lookups and bump the generation, telling embedding
    /// resolvers to forget their decisions.
    pub fn invalidate(&self) {
        self.by_mime.clear();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, "language providers invalidated");
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// First language any provider knows for `mime_type`. Memoized until the
    /// next registration or invalidation.
    pub fn find_language(&self, mime_type: &str) -> Option<Language> {
        if let Some(found) = self.by_mime.get(mime_type) {
            return found.value().clone();
        }
        let found = self
            .providers
            .read()
            .iter()
            .find_map(|provider| provider.find_language(mime_type));
        self.by_mime.insert(Box::from(mime_type), found.clone());
        found
    }

    /// First embedding any provider supplies.
    pub fn find_embedding(&self, query: &EmbeddingQuery<'_>) -> ProviderEmbedding {
        let providers = self.providers.read();
        for provider in providers.iter() {
            if let Some(spec) = provider.find_embedding(query) {
                return ProviderEmbedding {
                    spec: Some(spec),
                    cacheable: provider.is_id_invariant(),
                };
            }
        }
        ProviderEmbedding {
            spec: None,
            cacheable: providers.iter().all(|provider| provider.is_id_invariant()),
        }
    }
}

impl std::fmt::Debug for LanguageProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageProviders")
            .field("providers", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests;
