//! Command handlers for the `relex` binary.
//!
//! Handlers return [`CommandError`]; the binary prints it and exits with a
//! failure status. Multi-file commands process files in parallel and report
//! results in argument order.

mod check;
mod dump;
mod replay;

use std::path::Path;

use relex_engine::{ConsistencyDiagnostic, TextDocument, TokenHierarchy, TokenHierarchyError};
use relex_lang::{Language, LanguageError};
use relex_langs::SampleLanguages;
use thiserror::Error;

use crate::script::ScriptError;

pub use check::{check_files, CheckReport};
pub use dump::{dump_file, dump_files};
pub use replay::replay_file;

/// Flags shared by all commands.
#[derive(Clone, Debug, Default)]
pub struct CommandOptions {
    /// Language by extension, overriding the file's own.
    pub language: Option<String>,
    /// Machine-readable output.
    pub json: bool,
    /// Verify the hierarchy after every step.
    pub check: bool,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("cannot find file '{path}'")]
    NotFound { path: String },
    #[error("error reading '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no language for '{path}'; use --language=calc, --language=tmpl or --language=str")]
    UnknownLanguage { path: String },
    #[error("sample languages failed to load: {0}")]
    Languages(#[from] LanguageError),
    #[error("'{path}': {source}")]
    Hierarchy {
        path: String,
        #[source]
        source: TokenHierarchyError,
    },
    #[error("'{path}': {source}")]
    Script {
        path: String,
        #[source]
        source: ScriptError,
    },
    #[error("'{path}': {diagnostic}")]
    Inconsistent {
        path: String,
        diagnostic: ConsistencyDiagnostic,
    },
    #[error("'{path}' after edit {step}: {diagnostic}")]
    InconsistentAfterEdit {
        path: String,
        step: usize,
        diagnostic: ConsistencyDiagnostic,
    },
    #[error("'{path}' after edit {step}: tokens differ from lexing the text from scratch")]
    Diverged { path: String, step: usize },
    #[error("'{path}': rebuilding changed the tokens")]
    RebuildChanged { path: String },
    #[error("{count} of {total} files failed")]
    Failed { count: usize, total: usize },
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn read_file(path: &str) -> Result<String, CommandError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => CommandError::NotFound {
            path: path.to_owned(),
        },
        _ => CommandError::Read {
            path: path.to_owned(),
            source,
        },
    })
}

/// The language for `path`: the `--language` override or the file extension.
pub(crate) fn language_for(
    languages: &SampleLanguages,
    path: &str,
    options: &CommandOptions,
) -> Result<Language, CommandError> {
    let extension = options
        .language
        .as_deref()
        .or_else(|| Path::new(path).extension().and_then(|ext| ext.to_str()));
    extension
        .and_then(|extension| languages.for_extension(extension))
        .cloned()
        .ok_or_else(|| CommandError::UnknownLanguage {
            path: path.to_owned(),
        })
}

/// Read `path` and open a hierarchy over it.
pub(crate) fn open_file(
    languages: &SampleLanguages,
    path: &str,
    options: &CommandOptions,
) -> Result<TokenHierarchy<TextDocument>, CommandError> {
    let language = language_for(languages, path, options)?;
    let text = read_file(path)?;
    tracing::debug!(path, language = language.mime_type(), bytes = text.len(), "opened");
    Ok(TokenHierarchy::with_providers(
        TextDocument::new(text),
        language,
        languages.providers(),
    ))
}

pub(crate) fn hierarchy_error(path: &str) -> impl FnOnce(TokenHierarchyError) -> CommandError + '_ {
    move |source| CommandError::Hierarchy {
        path: path.to_owned(),
        source,
    }
}

/// Print outputs in order and errors to stderr; fail if any file failed.
pub(crate) fn report<T>(
    results: Vec<Result<T, CommandError>>,
    mut print: impl FnMut(T),
) -> Result<(), CommandError> {
    let total = results.len();
    let mut count = 0;
    for result in results {
        match result {
            Ok(output) => print(output),
            Err(error) => {
                eprintln!("error: {error}");
                count += 1;
            }
        }
    }
    if count == 0 {
        Ok(())
    } else {
        Err(CommandError::Failed { count, total })
    }
}

#[cfg(test)]
mod tests;
