use super::*;
use crate::test_support::{inner, outer, QUOTED};
use crate::{EmbeddingPresence, LanguagePath};
use pretty_assertions::assert_eq;
use relex_ir::Token;

struct EmbedEverything {
    language: Language,
    invariant: bool,
}

impl LanguageProvider for EmbedEverything {
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

#[test]
fn find_language_walks_chain_in_order() {
    let first = inner("text/x-a");
    let shadowed = inner("text/x-a");
    let providers = LanguageProviders::new();
    providers.register(Arc::new(LanguageSet::new([first.clone()])));
    providers.register(Arc::new(LanguageSet::new([shadowed, inner("text/x-b")])));

    assert_eq!(providers.find_language("text/x-a"), Some(first));
    assert_eq!(
        providers.find_language("text/x-b").map(|l| l.mime_type()),
        Some("text/x-b")
    );
    assert_eq!(providers.find_language("text/x-none"), None);
    assert_eq!(providers.len(), 2);
}

#[test]
fn register_bumps_generation_and_drops_memo() {
    let providers = LanguageProviders::new();
    let start = providers.generation();
    assert_eq!(providers.find_language("text/x-late"), None);

    providers.register(Arc::new(LanguageSet::new([inner("text/x-late")])));
    assert!(providers.generation() > start);
    assert!(providers.find_language("text/x-late").is_some());
}

#[test]
fn embedding_answers_report_cacheability() {
    let (outer, _) = outer(None, EmbeddingPresence::CachedFirstQuery);
    let path = LanguagePath::root(outer);
    let token = Token::new(QUOTED, 3);
    let query = EmbeddingQuery {
        token: &token,
        text: "'a'",
        path: &path,
        attributes: None,
    };

    let providers = LanguageProviders::new();
    providers.register(Arc::new(LanguageSet::default()));
    assert_eq!(
        providers.find_embedding(&query),
        ProviderEmbedding {
            spec: None,
            cacheable: true
        }
    );

    let embedded = inner("text/x-e");
    providers.register(Arc::new(EmbedEverything {
        language: embedded.clone(),
        invariant: false,
    }));
    let answer = providers.find_embedding(&query);
    assert_eq!(answer.spec, Some(EmbeddingSpec::new(embedded, 0, 0)));
    assert!(!answer.cacheable);
}
