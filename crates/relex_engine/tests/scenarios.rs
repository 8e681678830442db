//! End-to-end edit scenarios over the sample languages.
//!
//! Every scenario checks the incremental result against a hierarchy built
//! from scratch over the final text.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use relex_engine::{TextDocument, TokenHierarchy};
use relex_ir::{PartType, TokenIdSet};
use relex_lang::{Language, LanguagePath};
use relex_langs::{calc, strings, SampleLanguages};
use relex_lexer_core::{AttributeValue, InputAttributes};

fn open(languages: &SampleLanguages, language: &Language, document: TextDocument) -> TokenHierarchy<TextDocument> {
    TokenHierarchy::with_providers(document, language.clone(), languages.providers())
}

fn calc_doc(languages: &SampleLanguages, text: &str) -> TokenHierarchy<TextDocument> {
    open(languages, &languages.calc, TextDocument::new(text))
}

/// `(id, text, offset)` of every root token.
fn tokens(hierarchy: &TokenHierarchy<TextDocument>) -> Vec<(&'static str, String, u32)> {
    let mut seq = hierarchy.token_sequence().unwrap();
    let mut out = Vec::new();
    while seq.move_next() {
        let token = seq.token().unwrap().token;
        out.push((
            token.id().name(),
            seq.token_text().unwrap().into_owned(),
            seq.offset().unwrap(),
        ));
    }
    out
}

fn owned(expected: &[(&'static str, &str, u32)]) -> Vec<(&'static str, String, u32)> {
    expected
        .iter()
        .map(|&(id, text, offset)| (id, text.to_owned(), offset))
        .collect()
}

/// The hierarchy agrees with a fresh one over the same text and attributes.
fn assert_matches_batch(
    languages: &SampleLanguages,
    hierarchy: &TokenHierarchy<TextDocument>,
) {
    assert_eq!(hierarchy.check_consistency(), None);
    let fresh = open(languages, hierarchy.language(), hierarchy.input().clone());
    assert_eq!(hierarchy.snapshot().unwrap(), fresh.snapshot().unwrap());
}

#[test]
fn batch_lex_of_a_plus_bb() {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = calc_doc(&languages, "a+bb");
    assert_eq!(
        tokens(&hierarchy),
        owned(&[("IDENTIFIER", "a", 0), ("PLUS", "+", 1), ("IDENTIFIER", "bb", 2)])
    );
}

#[test]
fn insertion_extends_the_identifier_before_it() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "a+bb");
    tokens(&hierarchy);

    hierarchy.edit(1, 0, "c").unwrap().unwrap();
    assert_eq!(
        tokens(&hierarchy),
        owned(&[("IDENTIFIER", "ac", 0), ("PLUS", "+", 2), ("IDENTIFIER", "bb", 3)])
    );
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn removing_the_operator_merges_identifiers() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "a+bb");
    tokens(&hierarchy);

    let event = hierarchy.edit(1, 1, "").unwrap().unwrap();
    assert_eq!(tokens(&hierarchy), owned(&[("IDENTIFIER", "abb", 0)]));
    let change = &event.changes[0];
    assert_eq!(change.index, 0);
    assert_eq!(change.removed.len(), 3);
    assert_eq!(change.added.len(), 1);
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn edits_inside_a_string_leave_the_host_lexer_alone() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "x+\"ab\"");
    hierarchy.snapshot().unwrap();
    assert_eq!(hierarchy.list_count(), 2);
    languages.reset_stats();

    let event = hierarchy.edit(4, 0, "\\t").unwrap().unwrap();
    assert_eq!(languages.calc_stats.tokens_lexed(), 0);
    assert_eq!(languages.strings_stats.tokens_lexed(), 3);
    assert_eq!(
        tokens(&hierarchy),
        owned(&[("IDENTIFIER", "x", 0), ("PLUS", "+", 1), ("STRING", "\"a\\tb\"", 2)])
    );

    let strings_path = LanguagePath::root(languages.calc.clone()).embedded(languages.strings.clone());
    let inner: Vec<_> = event.changes_for(&strings_path).collect();
    assert_eq!(inner.len(), 1);
    assert!(inner[0].bounds_change);
    assert_eq!(inner[0].offset, 3);

    let mut seq = hierarchy.token_sequence().unwrap();
    seq.move_index(2);
    seq.move_next();
    let mut string = seq.embedded().unwrap();
    let mut texts = Vec::new();
    while string.move_next() {
        texts.push((string.token().unwrap().token.id(), string.token_text().unwrap().into_owned()));
    }
    assert_eq!(
        texts,
        vec![
            (strings::TEXT, "a".to_owned()),
            (strings::ESCAPE, "\\t".to_owned()),
            (strings::TEXT, "b".to_owned()),
        ]
    );
    assert_eq!(hierarchy.list_count(), 2);
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn closing_quote_removal_turns_the_string_into_a_start_part() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "\"ab\" + c");
    hierarchy.snapshot().unwrap();

    hierarchy.edit(3, 1, "").unwrap();
    let mut seq = hierarchy.token_sequence().unwrap();
    assert_eq!(seq.token_count(), 1);
    seq.move_next();
    assert_eq!(seq.token().unwrap().token.part(), PartType::Start);
    // Unterminated: only the opening quote is skipped.
    assert_eq!(seq.embedded().unwrap().token_count(), 1);
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn validators_patch_tokens_without_lexing() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "abc+12");
    tokens(&hierarchy);
    languages.reset_stats();

    let event = hierarchy.edit(1, 0, "x").unwrap().unwrap();
    assert_eq!(languages.calc_stats.tokens_lexed(), 0);
    assert_eq!(event.changes[0].added[0].len(), 4);

    hierarchy.edit(6, 0, "3").unwrap();
    assert_eq!(languages.calc_stats.tokens_lexed(), 0);
    assert_eq!(
        tokens(&hierarchy),
        owned(&[("IDENTIFIER", "axbc", 0), ("PLUS", "+", 4), ("NUMBER", "132", 5)])
    );
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn skipped_tokens_stay_skipped_across_edits() {
    let languages = SampleLanguages::new().unwrap();
    let mut attributes = InputAttributes::new();
    let whitespace: TokenIdSet = [calc::WHITESPACE].into_iter().collect();
    attributes.set(
        calc::MIME_TYPE,
        InputAttributes::SKIP_TOKEN_IDS,
        AttributeValue::TokenIds(whitespace),
    );
    let document = TextDocument::new("a  b ").with_attributes(attributes);
    let mut hierarchy = open(&languages, &languages.calc, document);
    assert_eq!(tokens(&hierarchy), owned(&[("IDENTIFIER", "a", 0), ("IDENTIFIER", "b", 3)]));

    hierarchy.edit(1, 0, "c").unwrap();
    assert_eq!(tokens(&hierarchy), owned(&[("IDENTIFIER", "ac", 0), ("IDENTIFIER", "b", 4)]));
    hierarchy.edit(2, 2, "+").unwrap();
    assert_eq!(
        tokens(&hierarchy),
        owned(&[("IDENTIFIER", "ac", 0), ("PLUS", "+", 2), ("IDENTIFIER", "b", 3)])
    );
    assert_matches_batch(&languages, &hierarchy);
}

fn flyweight_flags(hierarchy: &TokenHierarchy<TextDocument>) -> Vec<bool> {
    let mut seq = hierarchy.token_sequence().unwrap();
    let mut flags = Vec::new();
    while seq.move_next() {
        let located = seq.token().unwrap();
        // A token has an offset exactly when it is not a flyweight.
        assert_eq!(located.token.is_flyweight(), located.offset.is_none());
        flags.push(located.token.is_flyweight());
    }
    flags
}

#[test]
fn flyweight_runs_are_broken_up() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "((((((((");
    assert_eq!(
        flyweight_flags(&hierarchy),
        vec![true, true, true, true, true, false, true, true]
    );

    hierarchy.edit(0, 0, "(").unwrap();
    assert_eq!(
        flyweight_flags(&hierarchy),
        vec![true, true, true, true, true, false, true, true, true]
    );
    hierarchy.edit(3, 0, "x").unwrap();
    assert_eq!(
        flyweight_flags(&hierarchy),
        vec![true, true, true, false, true, true, true, true, true, false]
    );
    assert_matches_batch(&languages, &hierarchy);
}

#[test]
fn comments_opened_by_an_edit_swallow_the_rest() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = calc_doc(&languages, "a + b */ c");
    tokens(&hierarchy);

    hierarchy.edit(1, 0, "/*").unwrap();
    assert_eq!(
        tokens(&hierarchy),
        owned(&[
            ("IDENTIFIER", "a", 0),
            ("COMMENT", "/* + b */", 1),
            ("WHITESPACE", " ", 10),
            ("IDENTIFIER", "c", 11),
        ])
    );
    assert_matches_batch(&languages, &hierarchy);

    hierarchy.edit(9, 0, "x").unwrap();
    assert_matches_batch(&languages, &hierarchy);
}
