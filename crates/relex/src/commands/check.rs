//! `relex check`: build every token list of files and verify them.

use rayon::prelude::*;
use relex_engine::{MutableTextInput, TokenHierarchy};
use relex_langs::SampleLanguages;

use super::{hierarchy_error, open_file, report, CommandError, CommandOptions};

/// Summary of one verified file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub path: String,
    pub tokens: usize,
    pub lists: usize,
    pub language_paths: usize,
}

pub fn check_files(paths: &[String], options: &CommandOptions) -> Result<(), CommandError> {
    let languages = SampleLanguages::new()?;
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let mut hierarchy = open_file(&languages, path, options)?;
            check_hierarchy(path, &mut hierarchy)
        })
        .collect();
    report(results, |summary| {
        println!(
            "ok {}: {} tokens in {} lists, {} language paths",
            summary.path, summary.tokens, summary.lists, summary.language_paths
        );
    })
}

/// Expand every list, check consistency, then rebuild and compare.
#[tracing::instrument(level = "info", skip(hierarchy))]
pub(crate) fn check_hierarchy<I: MutableTextInput>(
    path: &str,
    hierarchy: &mut TokenHierarchy<I>,
) -> Result<CheckReport, CommandError> {
    let before = hierarchy.snapshot().map_err(hierarchy_error(path))?;
    if let Some(diagnostic) = hierarchy.check_consistency() {
        return Err(CommandError::Inconsistent {
            path: path.to_owned(),
            diagnostic,
        });
    }
    let report = CheckReport {
        path: path.to_owned(),
        tokens: before.len(),
        lists: hierarchy.list_count(),
        language_paths: hierarchy.language_paths().len(),
    };
    hierarchy.rebuild();
    let after = hierarchy.snapshot().map_err(hierarchy_error(path))?;
    if after != before {
        return Err(CommandError::RebuildChanged {
            path: path.to_owned(),
        });
    }
    tracing::debug!(tokens = report.tokens, lists = report.lists, "verified");
    Ok(report)
}
