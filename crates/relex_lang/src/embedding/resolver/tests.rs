use super::*;
use crate::test_support::{inner, outer, OTHER, QUOTED, WORD};
use crate::{Language, LanguageProvider, LanguageSet};
use pretty_assertions::assert_eq;
use relex_ir::Token;
use std::sync::atomic::Ordering;

struct Fallback {
    language: Language,
    invariant: bool,
}

impl LanguageProvider for Fallback {
    fn find_language(&self, _mime_type: &str) -> Option<Language> {
        None
    }

    fn find_embedding(&self, _query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        Some(EmbeddingSpec::new(self.language.clone(), 0, 0))
    }

    fn is_id_invariant(&self) -> bool {
        self.invariant
    }
}

fn query<'a>(token: &'a Token, path: &'a LanguagePath) -> EmbeddingQuery<'a> {
    EmbeddingQuery {
        token,
        text: "'xy'",
        path,
        attributes: None,
    }
}

// === Presence policies ===

#[test]
fn presence_none_skips_every_hook() {
    let (outer, calls) = outer(Some(inner("text/x-in")), EmbeddingPresence::CachedFirstQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let token = Token::new(OTHER, 4);
    assert_eq!(resolver.resolve(&query(&token, &path)), None);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn cached_first_query_reuses_decision() {
    let embedded = inner("text/x-in");
    let (outer, calls) = outer(Some(embedded.clone()), EmbeddingPresence::CachedFirstQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let token = Token::new(QUOTED, 4);
    let expected = Some(EmbeddingSpec::new(embedded, 1, 1));
    assert_eq!(resolver.resolve(&query(&token, &path)), expected);
    assert_eq!(resolver.resolve(&query(&token, &path)), expected);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(
        resolver.decision(&path, QUOTED.ordinal()),
        EmbeddingDecision::Cached(expected)
    );
}

#[test]
fn cached_first_query_remembers_absence() {
    let (outer, calls) = outer(None, EmbeddingPresence::CachedFirstQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let token = Token::new(WORD, 2);
    assert_eq!(resolver.resolve(&query(&token, &path)), None);
    assert_eq!(resolver.resolve(&query(&token, &path)), None);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(
        resolver.decision(&path, WORD.ordinal()),
        EmbeddingDecision::Cached(None)
    );
}

#[test]
fn always_query_asks_every_time() {
    let (outer, calls) = outer(Some(inner("text/x-in")), EmbeddingPresence::AlwaysQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let token = Token::new(QUOTED, 4);
    resolver.resolve(&query(&token, &path));
    resolver.resolve(&query(&token, &path));
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(
        resolver.decision(&path, QUOTED.ordinal()),
        EmbeddingDecision::NotQueried
    );
}

// === Providers ===

#[test]
fn hierarchy_hook_wins_over_providers() {
    let own = inner("text/x-own");
    let (outer, _) = outer(Some(own.clone()), EmbeddingPresence::CachedFirstQuery);
    let providers = Arc::new(LanguageProviders::new());
    providers.register(Arc::new(Fallback {
        language: inner("text/x-provided"),
        invariant: true,
    }));
    let resolver = EmbeddingResolver::new(providers);
    let path = LanguagePath::root(outer);

    let token = Token::new(QUOTED, 4);
    let spec = resolver.resolve(&query(&token, &path));
    assert_eq!(spec.map(|spec| spec.language), Some(own));
}

#[test]
fn non_invariant_provider_answers_are_requeried() {
    let provided = inner("text/x-provided");
    let (outer, calls) = outer(None, EmbeddingPresence::CachedFirstQuery);
    let providers = Arc::new(LanguageProviders::new());
    providers.register(Arc::new(Fallback {
        language: provided.clone(),
        invariant: false,
    }));
    let resolver = EmbeddingResolver::new(providers);
    let path = LanguagePath::root(outer);

    let token = Token::new(WORD, 2);
    let first = resolver.resolve(&query(&token, &path));
    assert_eq!(first.map(|spec| spec.language), Some(provided));
    assert_eq!(
        resolver.decision(&path, WORD.ordinal()),
        EmbeddingDecision::AlwaysQuery
    );
    resolver.resolve(&query(&token, &path));
    assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[test]
fn registering_a_provider_drops_decisions() {
    let (outer, calls) = outer(None, EmbeddingPresence::CachedFirstQuery);
    let providers = Arc::new(LanguageProviders::new());
    let resolver = EmbeddingResolver::new(Arc::clone(&providers));
    let path = LanguagePath::root(outer);
    let token = Token::new(WORD, 2);

    assert_eq!(resolver.resolve(&query(&token, &path)), None);
    providers.register(Arc::new(LanguageSet::default()));
    assert_eq!(
        resolver.decision(&path, WORD.ordinal()),
        EmbeddingDecision::NotQueried
    );
    resolver.resolve(&query(&token, &path));
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    resolver.invalidate();
    resolver.resolve(&query(&token, &path));
    assert_eq!(calls.load(Ordering::Relaxed), 3);
}

// === Token checks ===

#[test]
fn flyweight_tokens_never_host_embeddings() {
    let (outer, calls) = outer(Some(inner("text/x-in")), EmbeddingPresence::AlwaysQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let token = Token::flyweight(QUOTED, "''");
    assert_eq!(resolver.resolve(&query(&token, &path)), None);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn skips_must_fit_in_token() {
    let (outer, _) = outer(Some(inner("text/x-in")), EmbeddingPresence::AlwaysQuery);
    let path = LanguagePath::root(outer);
    let resolver = EmbeddingResolver::new(Arc::new(LanguageProviders::new()));

    let short = Token::new(QUOTED, 1);
    assert_eq!(resolver.resolve(&query(&short, &path)), None);
    let exact = Token::new(QUOTED, 2);
    assert!(resolver.resolve(&query(&exact, &path)).is_some());
}
