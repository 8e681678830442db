//! `relex dump`: print the token hierarchy of files.

use std::fmt::Write as _;

use rayon::prelude::*;
use relex_engine::{MutableTextInput, TokenHierarchy, TokenSequence};
use relex_ir::PartType;
use relex_langs::SampleLanguages;
use serde::Serialize;

use super::{hierarchy_error, open_file, report, CommandError, CommandOptions};

#[derive(Serialize)]
struct JsonToken {
    path: String,
    id: &'static str,
    offset: u32,
    len: u32,
    part: PartType,
    lookahead: u32,
}

#[derive(Serialize)]
struct JsonDump<'a> {
    file: &'a str,
    tokens: Vec<JsonToken>,
}

pub fn dump_files(paths: &[String], options: &CommandOptions) -> Result<(), CommandError> {
    let languages = SampleLanguages::new()?;
    let outputs: Vec<_> = paths
        .par_iter()
        .map(|path| dump_file(&languages, path, options))
        .collect();
    report(outputs, |output| print!("{output}"))
}

#[tracing::instrument(level = "info", skip(languages, options))]
pub fn dump_file(
    languages: &SampleLanguages,
    path: &str,
    options: &CommandOptions,
) -> Result<String, CommandError> {
    let hierarchy = open_file(languages, path, options)?;
    if options.json {
        return render_json(path, &hierarchy);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{path} [{}]", hierarchy.language().mime_type());
    let mut seq = hierarchy.try_token_sequence().map_err(hierarchy_error(path))?;
    write_sequence(&mut out, &mut seq, 1);
    Ok(out)
}

pub(crate) fn render_json<I: MutableTextInput>(
    file: &str,
    hierarchy: &TokenHierarchy<I>,
) -> Result<String, CommandError> {
    let rows = hierarchy.snapshot().map_err(hierarchy_error(file))?;
    let tokens = rows
        .into_iter()
        .map(|row| JsonToken {
            path: row.path,
            id: row.id,
            offset: row.offset,
            len: row.len,
            part: row.part,
            lookahead: row.lookahead,
        })
        .collect();
    let mut out = serde_json::to_string_pretty(&JsonDump { file, tokens })?;
    out.push('\n');
    Ok(out)
}

/// One line per token, embedded lists indented under their host.
pub(crate) fn write_sequence<I: MutableTextInput>(
    out: &mut String,
    seq: &mut TokenSequence<'_, I>,
    depth: usize,
) {
    let indent = depth * 2;
    while seq.move_next() {
        let Some(located) = seq.token() else {
            break;
        };
        let token = located.token;
        let text = seq.token_text().unwrap_or_default();
        let _ = write!(
            out,
            "{:indent$}{} {}+{} {:?}",
            "",
            token.id().name(),
            seq.offset().unwrap_or_default(),
            token.len(),
            text,
        );
        if token.part() != PartType::Complete {
            let _ = write!(out, " {:?}", token.part());
        }
        if located.offset.is_none() {
            out.push_str(" (flyweight)");
        } else if token.has_custom_text() {
            out.push_str(" (custom)");
        }
        out.push('\n');
        if let Some(mut inner) = seq.embedded() {
            let _ = writeln!(out, "{:indent$}  [{}]", "", inner.language_path().mime_path());
            write_sequence(out, &mut inner, depth + 2);
        }
    }
}
