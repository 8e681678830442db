//! `relex replay`: apply an edit script to a file and report every change.

use std::fmt::Write as _;

use relex_engine::{TextDocument, TokenHierarchy, TokenHierarchyEvent};
use relex_ir::incremental::TextChange;
use relex_ir::{Span, Token};
use relex_langs::SampleLanguages;
use serde::Serialize;

use super::{hierarchy_error, open_file, read_file, CommandError, CommandOptions};
use crate::script::{self, ScriptEdit};

#[derive(Serialize)]
struct JsonChange {
    path: String,
    index: usize,
    offset: u32,
    removed: Vec<&'static str>,
    added: Vec<&'static str>,
    bounds_change: bool,
}

#[derive(Serialize)]
struct JsonEvent {
    step: usize,
    modification: Option<TextChange>,
    affected: Span,
    join_cascades: u32,
    changes: Vec<JsonChange>,
}

impl JsonEvent {
    fn new(step: usize, event: &TokenHierarchyEvent) -> Self {
        let names = |tokens: &[Token]| -> Vec<&'static str> {
            tokens.iter().map(|token| token.id().name()).collect()
        };
        JsonEvent {
            step,
            modification: event.modification,
            affected: event.affected,
            join_cascades: event.join_cascades,
            changes: event
                .changes
                .iter()
                .map(|change| JsonChange {
                    path: change.path.mime_path().to_owned(),
                    index: change.index,
                    offset: change.offset,
                    removed: names(&change.removed),
                    added: names(&change.added),
                    bounds_change: change.bounds_change,
                })
                .collect(),
        }
    }
}

#[tracing::instrument(level = "info", skip(options))]
pub fn replay_file(path: &str, script_path: &str, options: &CommandOptions) -> Result<(), CommandError> {
    let languages = SampleLanguages::new()?;
    let edits = script::parse(&read_file(script_path)?).map_err(|source| CommandError::Script {
        path: script_path.to_owned(),
        source,
    })?;
    let mut hierarchy = open_file(&languages, path, options)?;
    let output = replay(&languages, path, &mut hierarchy, &edits, options)?;
    print!("{output}");
    Ok(())
}

/// Apply `edits` in order and render their events.
pub(crate) fn replay(
    languages: &SampleLanguages,
    path: &str,
    hierarchy: &mut TokenHierarchy<TextDocument>,
    edits: &[ScriptEdit],
    options: &CommandOptions,
) -> Result<String, CommandError> {
    // Build every list up front so embedded lists are updated, not relexed.
    hierarchy.snapshot().map_err(hierarchy_error(path))?;
    let mut out = String::new();
    for (step, edit) in edits.iter().enumerate().map(|(i, edit)| (i + 1, edit)) {
        tracing::debug!(step, line = edit.line, offset = edit.offset, "applying edit");
        let event = hierarchy
            .edit(edit.offset, edit.remove, &edit.text)
            .map_err(hierarchy_error(path))?;
        match (&event, options.json) {
            (Some(event), true) => {
                out.push_str(&serde_json::to_string(&JsonEvent::new(step, event))?);
                out.push('\n');
            }
            (Some(event), false) => write_event(&mut out, step, event),
            (None, _) => {
                let _ = writeln!(out, "edit {step}: no tokens to update");
            }
        }
        hierarchy.snapshot().map_err(hierarchy_error(path))?;
        if options.check {
            verify(languages, path, hierarchy, step)?;
        }
    }
    if !options.json {
        let tokens = hierarchy.snapshot().map_err(hierarchy_error(path))?.len();
        let _ = writeln!(
            out,
            "{} edits, {tokens} tokens in {} lists",
            edits.len(),
            hierarchy.list_count()
        );
    }
    Ok(out)
}

fn write_event(out: &mut String, step: usize, event: &TokenHierarchyEvent) {
    let _ = write!(out, "edit {step}: affected {}", event.affected);
    if event.join_cascades > 0 {
        let _ = write!(out, ", {} joined sections relexed", event.join_cascades);
    }
    out.push('\n');
    for change in &event.changes {
        let _ = writeln!(
            out,
            "  {} #{} @{}: -{} +{}{}",
            change.path.mime_path(),
            change.index,
            change.offset,
            change.removed.len(),
            change.added.len(),
            if change.bounds_change { " (bounds)" } else { "" },
        );
    }
}

fn verify(
    languages: &SampleLanguages,
    path: &str,
    hierarchy: &TokenHierarchy<TextDocument>,
    step: usize,
) -> Result<(), CommandError> {
    if let Some(diagnostic) = hierarchy.check_consistency() {
        return Err(CommandError::InconsistentAfterEdit {
            path: path.to_owned(),
            step,
            diagnostic,
        });
    }
    let fresh = TokenHierarchy::with_providers(
        hierarchy.input().clone(),
        hierarchy.language().clone(),
        languages.providers(),
    );
    let actual = hierarchy.snapshot().map_err(hierarchy_error(path))?;
    let expected = fresh.snapshot().map_err(hierarchy_error(path))?;
    if actual != expected {
        return Err(CommandError::Diverged {
            path: path.to_owned(),
            step,
        });
    }
    Ok(())
}
