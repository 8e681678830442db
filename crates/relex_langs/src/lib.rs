//! Sample languages for relex.
//!
//! - [`calc`]: arithmetic expressions with identifiers, numbers, string
//!   literals and block comments. Strings embed [`strings`].
//! - [`strings`]: escape sequences inside calc string literals, tokenized
//!   with logos.
//! - [`tmpl`]: template text with `<% %>` code sections. Code sections embed
//!   calc and are joined, so a comment opened in one section continues in
//!   the next.
//!
//! Every lexer counts its work in a [`LexerStats`] so callers can see which
//! languages an edit actually relexed.

pub mod calc;
mod stats;
pub mod strings;
pub mod tmpl;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use relex_lang::{Language, LanguageError, LanguageProviders, LanguageSet};

pub use stats::LexerStats;

/// The three sample languages, wired together.
#[derive(Clone, Debug)]
pub struct SampleLanguages {
    pub calc: Language,
    pub strings: Language,
    pub tmpl: Language,
    pub calc_stats: Arc<LexerStats>,
    pub strings_stats: Arc<LexerStats>,
    pub tmpl_stats: Arc<LexerStats>,
}

impl SampleLanguages {
    pub fn new() -> Result<Self, LanguageError> {
        let strings_stats = Arc::new(LexerStats::default());
        let calc_stats = Arc::new(LexerStats::default());
        let tmpl_stats = Arc::new(LexerStats::default());
        let strings = Language::new(strings::Strings::new(Arc::clone(&strings_stats)))?;
        let calc = Language::new(calc::Calc::new(
            Some(strings.clone()),
            Arc::clone(&calc_stats),
        ))?;
        let tmpl = Language::new(tmpl::Tmpl::new(calc.clone(), Arc::clone(&tmpl_stats)))?;
        Ok(SampleLanguages {
            calc,
            strings,
            tmpl,
            calc_stats,
            strings_stats,
            tmpl_stats,
        })
    }

    /// Provider chain serving all three languages by mime type.
    pub fn providers(&self) -> Arc<LanguageProviders> {
        let providers = Arc::new(LanguageProviders::new());
        providers.register(Arc::new(LanguageSet::new([
            self.calc.clone(),
            self.strings.clone(),
            self.tmpl.clone(),
        ])));
        providers
    }

    /// Language for a file extension, as used by the `relex` binary.
    pub fn for_extension(&self, extension: &str) -> Option<&Language> {
        match extension {
            "calc" => Some(&self.calc),
            "tmpl" => Some(&self.tmpl),
            "str" => Some(&self.strings),
            _ => None,
        }
    }

    pub fn reset_stats(&self) {
        self.calc_stats.reset();
        self.strings_stats.reset();
        self.tmpl_stats.reset();
    }
}
