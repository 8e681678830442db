//! Lexing context over the sample languages.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use relex_lang::EmbeddingResolver;
use relex_langs::SampleLanguages;
use relex_lexer_core::InputAttributes;

use crate::config::HierarchyConfig;
use crate::lexing::{LexContext, LexerPool};

pub(crate) struct Fixture {
    pub languages: SampleLanguages,
    pub text: String,
    pub attributes: Option<InputAttributes>,
    pub resolver: EmbeddingResolver,
    pub pool: LexerPool,
    pub config: HierarchyConfig,
}

impl Fixture {
    pub fn new(text: &str) -> Self {
        let languages = SampleLanguages::new().unwrap();
        let resolver = EmbeddingResolver::new(languages.providers());
        let config = HierarchyConfig::default();
        Fixture {
            pool: LexerPool::new(config.lexer_pool_capacity),
            resolver,
            config,
            attributes: None,
            text: text.to_owned(),
            languages,
        }
    }

    pub fn with_attributes(mut self, attributes: InputAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn cx(&self) -> LexContext<'_> {
        LexContext {
            text: &self.text,
            attributes: self.attributes.as_ref(),
            resolver: &self.resolver,
            pool: &self.pool,
            config: &self.config,
        }
    }
}
