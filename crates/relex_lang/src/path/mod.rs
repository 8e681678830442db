//! Language paths: the chain of languages from the root down to one
//! embedding level.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::language::Language;

/// Immutable, cheaply cloned chain of languages.
///
/// Two paths are equal iff their language sequences are equal.
#[derive(Clone)]
pub struct LanguagePath {
    inner: Arc<PathInner>,
}

struct PathInner {
    languages: SmallVec<[Language; 4]>,
    /// Mime types joined with `/`, e.g. `text/x-tmpl/text/x-calc`.
    mime_path: Box<str>,
}

impl LanguagePath {
    /// Single-language path.
    pub fn root(language: Language) -> LanguagePath {
        LanguagePath::from_languages(smallvec::smallvec![language])
    }

    /// This path extended by one embedded language.
    #[must_use]
    pub fn embedded(&self, language: Language) -> LanguagePath {
        let mut languages = self.inner.languages.clone();
        languages.push(language);
        LanguagePath::from_languages(languages)
    }

    /// Path without its innermost language; `None` for a root path.
    pub fn parent(&self) -> Option<LanguagePath> {
        let languages = &self.inner.languages;
        if languages.len() <= 1 {
            return None;
        }
        Some(LanguagePath::from_languages(
            languages[..languages.len() - 1].iter().cloned().collect(),
        ))
    }

    fn from_languages(languages: SmallVec<[Language; 4]>) -> LanguagePath {
        let mime_path = languages
            .iter()
            .map(Language::mime_type)
            .collect::<Vec<_>>()
            .join("/")
            .into_boxed_str();
        LanguagePath {
            inner: Arc::new(PathInner {
                languages,
                mime_path,
            }),
        }
    }

    /// Innermost language.
    pub fn inner_language(&self) -> &Language {
        // Paths are built from at least one language.
        &self.inner.languages[self.inner.languages.len() - 1]
    }

    /// Root language.
    pub fn top_language(&self) -> &Language {
        &self.inner.languages[0]
    }

    pub fn language(&self, index: usize) -> Option<&Language> {
        self.inner.languages.get(index)
    }

    pub fn languages(&self) -> &[Language] {
        &self.inner.languages
    }

    /// Number of languages in the path.
    pub fn size(&self) -> usize {
        self.inner.languages.len()
    }

    pub fn mime_path(&self) -> &str {
        &self.inner.mime_path
    }

    /// `true` if the innermost languages of this path are `suffix`.
    pub fn ends_with(&self, suffix: &LanguagePath) -> bool {
        self.inner.languages.ends_with(&suffix.inner.languages)
    }

    /// `true` if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &LanguagePath) -> bool {
        self.inner.languages.starts_with(&prefix.inner.languages)
    }
}

impl PartialEq for LanguagePath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.languages == other.inner.languages
    }
}

impl Eq for LanguagePath {}

impl Hash for LanguagePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.languages.hash(state);
    }
}

impl fmt::Debug for LanguagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguagePath({})", self.inner.mime_path)
    }
}

impl fmt::Display for LanguagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.mime_path)
    }
}
