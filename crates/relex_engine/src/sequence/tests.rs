#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;
use relex_langs::{calc, strings, SampleLanguages};

use crate::input::TextDocument;

fn hierarchy(text: &str) -> (SampleLanguages, TokenHierarchy<TextDocument>) {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = TokenHierarchy::with_providers(
        TextDocument::new(text),
        languages.calc.clone(),
        languages.providers(),
    );
    (languages, hierarchy)
}

#[test]
fn walks_both_ways() {
    let (_, hierarchy) = hierarchy("a+bb");
    let mut seq = hierarchy.token_sequence().unwrap();
    assert_eq!(seq.token_count(), 3);
    assert_eq!(seq.index(), None);
    assert!(!seq.move_previous());

    assert!(seq.move_next());
    assert_eq!(seq.token().unwrap().offset, Some(0));
    assert_eq!(seq.token_text().unwrap(), "a");

    assert!(seq.move_next());
    let plus = seq.token().unwrap();
    assert_eq!(plus.token.id(), calc::PLUS);
    // Flyweights carry no offset; the sequence still knows it.
    assert_eq!(plus.offset, None);
    assert_eq!(seq.offset(), Some(1));
    assert_eq!(seq.token_text().unwrap(), "+");

    assert!(seq.move_next());
    assert_eq!(seq.token_text().unwrap(), "bb");
    assert!(!seq.move_next());
    assert_eq!(seq.index(), Some(2));

    assert!(seq.move_previous());
    assert_eq!(seq.index(), Some(1));
}

#[test]
fn move_end_then_previous_lands_on_last_token() {
    let (_, hierarchy) = hierarchy("a+bb");
    let mut seq = hierarchy.token_sequence().unwrap();
    seq.move_end();
    assert!(!seq.move_next());
    assert!(seq.move_previous());
    assert_eq!(seq.index(), Some(2));

    seq.move_start();
    assert!(seq.move_next());
    assert_eq!(seq.index(), Some(0));

    seq.move_index(10);
    assert!(seq.move_previous());
    assert_eq!(seq.index(), Some(2));
}

#[test]
fn move_to_reports_distance_from_token_start() {
    let (_, hierarchy) = hierarchy("a+bb");
    let mut seq = hierarchy.token_sequence().unwrap();
    assert_eq!(seq.move_to(3), Some(1));
    assert_eq!(seq.index(), None);
    assert!(seq.move_next());
    assert_eq!(seq.index(), Some(2));

    assert_eq!(seq.move_to(0), Some(0));
    assert!(seq.move_next());
    assert_eq!(seq.index(), Some(0));

    // Past the end: the last token, at a distance beyond its length.
    assert_eq!(seq.move_to(9), Some(7));
    assert!(seq.move_next());
    assert_eq!(seq.index(), Some(2));
}

#[test]
fn empty_input_has_an_empty_sequence() {
    let (_, hierarchy) = hierarchy("");
    let mut seq = hierarchy.token_sequence().unwrap();
    assert_eq!(seq.token_count(), 0);
    assert_eq!(seq.move_to(0), None);
    assert!(!seq.move_next());
    assert_eq!(seq.token(), None);
}

#[test]
fn exposes_lookahead_and_state() {
    let (_, hierarchy) = hierarchy("1.x /* y");
    let mut seq = hierarchy.token_sequence().unwrap();
    seq.move_next();
    assert_eq!(seq.lookahead(), Some(2));
    assert_eq!(seq.state(), Some(LexerState::Default));
    seq.move_end();
    seq.move_previous();
    assert_eq!(seq.token_text().unwrap(), "/* y");
    assert_eq!(seq.state(), Some(LexerState::small(calc::IN_COMMENT)));
}

#[test]
fn descends_into_embedded_lists() {
    let (languages, hierarchy) = hierarchy("x+\"a\\n\"");
    let mut seq = hierarchy.token_sequence().unwrap();
    seq.move_next();
    assert!(seq.embedded().is_none());

    seq.move_index(2);
    seq.move_next();
    assert!(seq.embedded_for(&languages.tmpl).is_none());
    let mut inner = seq.embedded().unwrap();
    assert_eq!(inner.language().mime_type(), strings::MIME_TYPE);
    assert_eq!(inner.language_path().size(), 2);
    assert_eq!(inner.token_count(), 2);
    inner.move_next();
    assert_eq!(inner.offset(), Some(3));
    assert_eq!(inner.token_text().unwrap(), "a");
    inner.move_next();
    assert_eq!(inner.token().unwrap().token.id(), strings::ESCAPE);
    assert_eq!(inner.token_text().unwrap(), "\\n");

    let again = seq.embedded_for(&languages.strings).unwrap();
    assert_eq!(again.token_count(), 2);
    assert_eq!(hierarchy.list_count(), 2);
}
