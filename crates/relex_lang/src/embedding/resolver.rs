//! Embedding resolution with per-id decision caching.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{EmbeddingPresence, EmbeddingQuery, EmbeddingSpec};
use crate::path::LanguagePath;
use crate::provider::LanguageProviders;

/// Cached decision for one token id at one language path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EmbeddingDecision {
    #[default]
    NotQueried,
    Cached(Option<EmbeddingSpec>),
    /// A previous answer could not be cached; ask every time.
    AlwaysQuery,
}

#[derive(Default)]
struct DecisionCache {
    generation: u64,
    decisions: FxHashMap<(LanguagePath, u16), EmbeddingDecision>,
}

/// Decides which language, if any, is embedded in a token.
///
/// First match wins:
/// 1. [`EmbeddingPresence::None`] rejects immediately.
/// 2. A cached decision for the id at this path is reused.
/// 3. The language hierarchy's own hook.
/// 4. The provider chain, in registration order.
pub struct EmbeddingResolver {
    providers: Arc<LanguageProviders>,
    cache: Mutex<DecisionCache>,
}

impl EmbeddingResolver {
    pub fn new(providers: Arc<LanguageProviders>) -> Self {
        let generation = providers.generation();
        EmbeddingResolver {
            providers,
            cache: Mutex::new(DecisionCache {
                generation,
                decisions: FxHashMap::default(),
            }),
        }
    }

    pub fn providers(&self) -> &Arc<LanguageProviders> {
        &self.providers
    }

    /// Forget every cached decision.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock();
        cache.decisions.clear();
        cache.generation = self.providers.generation();
        tracing::debug!(generation = cache.generation, "embedding decisions dropped");
    }

    /// Current decision for an id, for inspection.
    pub fn decision(&self, path: &LanguagePath, ordinal: u16) -> EmbeddingDecision {
        let mut cache = self.cache.lock();
        self.sync_generation(&mut cache);
        cache
            .decisions
            .get(&(path.clone(), ordinal))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve the embedding for `query.token`.
    ///
    /// Flyweight tokens never host embeddings, and a spec whose skips do not
    /// fit in the token is rejected.
    pub fn resolve(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        let token = query.token;
        if token.is_flyweight() {
            return None;
        }
        let language = query.path.inner_language();
        let presence = language.embedding_presence(token.id());
        let spec = match presence {
            EmbeddingPresence::None => return None,
            EmbeddingPresence::AlwaysQuery => self.query(query).0,
            EmbeddingPresence::CachedFirstQuery => self.resolve_cached(query),
        }?;

        if !spec.fits(token.len()) {
            tracing::warn!(
                token = %token.id(),
                len = token.len(),
                start_skip = spec.start_skip,
                end_skip = spec.end_skip,
                "embedding skips exceed token length"
            );
            return None;
        }
        Some(spec)
    }

    fn resolve_cached(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        let key = (query.path.clone(), query.token.id().ordinal());
        {
            let mut cache = self.cache.lock();
            self.sync_generation(&mut cache);
            match cache.decisions.get(&key) {
                Some(EmbeddingDecision::Cached(spec)) => return spec.clone(),
                Some(EmbeddingDecision::AlwaysQuery) => return self.query(query).0,
                Some(EmbeddingDecision::NotQueried) | None => {}
            }
        }

        // Hooks run unlocked; they may consult the provider chain.
        let (spec, cacheable) = self.query(query);
        let decision = if cacheable {
            EmbeddingDecision::Cached(spec.clone())
        } else {
            EmbeddingDecision::AlwaysQuery
        };
        tracing::trace!(
            path = %query.path,
            token = %query.token.id(),
            ?decision,
            "embedding decision recorded"
        );
        self.cache.lock().decisions.insert(key, decision);
        spec
    }

    /// Ask the hierarchy, then the providers. Returns the answer and whether
    /// it may be cached per id.
    fn query(&self, query: &EmbeddingQuery<'_>) -> (Option<EmbeddingSpec>, bool) {
        if let Some(spec) = query.path.inner_language().hierarchy_embedding(query) {
            return (Some(spec), true);
        }
        let answer = self.providers.find_embedding(query);
        (answer.spec, answer.cacheable)
    }

    fn sync_generation(&self, cache: &mut DecisionCache) {
        let generation = self.providers.generation();
        if cache.generation != generation {
            cache.decisions.clear();
            cache.generation = generation;
        }
    }
}

impl std::fmt::Debug for EmbeddingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("EmbeddingResolver")
            .field("generation", &cache.generation)
            .field("decisions", &cache.decisions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
