//! Languages for relex.
//!
//! - [`Language`]: a validated token-id universe plus the lexer factory and
//!   the embedding and validator hooks of a [`LanguageHierarchy`]
//! - [`LanguagePath`]: the chain of languages from the document root down
//!   to one embedding level
//! - [`LanguageProviders`]: the explicitly passed provider chain
//! - [`EmbeddingResolver`]: decides which language a token embeds, caching
//!   decisions per token id

mod embedding;
mod language;
mod path;
mod provider;
mod validator;

pub use embedding::{
    EmbeddingDecision, EmbeddingPresence, EmbeddingQuery, EmbeddingResolver, EmbeddingSpec,
};
pub use language::{Language, LanguageError, LanguageHierarchy, LanguageId};
pub use path::LanguagePath;
pub use provider::{LanguageProvider, LanguageProviders, LanguageSet, ProviderEmbedding};
pub use validator::{TokenValidator, ValidationEdit};

#[cfg(test)]
mod test_support;
