//! Validators patching calc tokens after small edits inside them.
//!
//! Each validator accepts an edit only if relexing would yield one token of
//! the same shape with the same lookahead past its end.

use relex_ir::{PartType, Token};
use relex_lang::{TokenValidator, ValidationEdit};

use super::{is_ident_continue, is_ident_start, IDENTIFIER, STRING};

pub(super) struct IdentifierValidator;

impl TokenValidator for IdentifierValidator {
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token> {
        let mut chars = edit.text.chars();
        let valid = chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue);
        valid.then(|| Token::new(IDENTIFIER, edit.new_len()))
    }
}

/// Accepts digit insertions that keep a number integral or fractional, so
/// the patched token keeps its shape property.
///
/// Removed text is not available, so removals always go to the lexer.
pub(super) struct NumberValidator;

/// `Some(true)` for a fractional number, `Some(false)` for an integral one.
fn number_shape(text: &str) -> Option<bool> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || fraction.is_some_and(|fraction| !digits(fraction)) {
        return None;
    }
    Some(fraction.is_some())
}

impl TokenValidator for NumberValidator {
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token> {
        if edit.removed != 0 {
            return None;
        }
        let start = edit.offset as usize;
        let end = start + edit.inserted as usize;
        let old = format!("{}{}", edit.text.get(..start)?, edit.text.get(end..)?);
        (number_shape(&old)? == number_shape(edit.text)?)
            .then(|| edit.token.with_len(edit.new_len()))
    }
}

/// Accepts edits that leave a string literal terminated by its last quote.
pub(super) struct StringValidator;

fn terminated_string_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => return Some(index + 1),
            '\\' => {
                chars.next();
            }
            '\n' => return None,
            _ => {}
        }
    }
    None
}

impl TokenValidator for StringValidator {
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token> {
        if edit.token.part() != PartType::Complete {
            return None;
        }
        (terminated_string_len(edit.text)? == edit.text.len())
            .then(|| Token::new(STRING, edit.new_len()))
    }
}
