//! Edit scripts for `relex replay`.
//!
//! One edit per line: `<offset> <remove> [text]`. The text is everything
//! after the second space, with `\n`, `\t`, `\r`, `\s` (space) and `\\`
//! escapes. Blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! # turn "a+bb" into "ac+bb", then drop the plus
//! 1 0 c
//! 2 1
//! ```

use thiserror::Error;

/// One replacement, in the coordinates of the text before it is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEdit {
    /// 1-based script line.
    pub line: usize,
    pub offset: u32,
    pub remove: u32,
    pub text: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: `{value}` is not a valid {field}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: unknown escape `\\{escape}`")]
    InvalidEscape { line: usize, escape: char },
}

pub fn parse(source: &str) -> Result<Vec<ScriptEdit>, ScriptError> {
    source
        .lines()
        .enumerate()
        .map(|(index, raw)| (index + 1, raw.trim_end_matches('\r')))
        .filter(|(_, raw)| !raw.trim().is_empty() && !raw.trim_start().starts_with('#'))
        .map(|(line, raw)| parse_line(line, raw))
        .collect()
}

fn parse_line(line: usize, raw: &str) -> Result<ScriptEdit, ScriptError> {
    let mut fields = raw.trim_start().splitn(3, ' ');
    let offset = number(line, "offset", fields.next())?;
    let remove = number(line, "remove length", fields.next())?;
    let text = unescape(line, fields.next().unwrap_or(""))?;
    Ok(ScriptEdit {
        line,
        offset,
        remove,
        text,
    })
}

fn number(line: usize, field: &'static str, value: Option<&str>) -> Result<u32, ScriptError> {
    let value = value
        .filter(|value| !value.is_empty())
        .ok_or(ScriptError::MissingField { line, field })?;
    value.parse().map_err(|_| ScriptError::InvalidNumber {
        line,
        field,
        value: value.to_owned(),
    })
}

fn unescape(line: usize, text: &str) -> Result<String, ScriptError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('s') => ' ',
            Some('\\') => '\\',
            Some(other) => return Err(ScriptError::InvalidEscape { line, escape: other }),
            None => {
                return Err(ScriptError::MissingField {
                    line,
                    field: "escape after `\\`",
                })
            }
        };
        out.push(escaped);
    }
    Ok(out)
}
