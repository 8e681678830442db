#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;
use relex_ir::Token;
use relex_langs::calc;

use crate::test_support::Fixture;

fn built(fixture: &Fixture, language: &Language) -> (HierarchyState, ListId) {
    let mut state = HierarchyState::new();
    let root = state.build_root(&fixture.cx(), language).unwrap();
    (state, root)
}

fn kind(state: &HierarchyState, fixture: &Fixture) -> Option<(DiagnosticKind, Option<usize>)> {
    check(state, &fixture.cx(), true, 0).map(|found| (found.kind, found.index))
}

#[test]
fn fresh_lists_are_consistent() {
    let fixture = Fixture::new("<% a /* %>x<% */ \"s\\n\" %>");
    let (mut state, root) = built(&fixture, &fixture.languages.tmpl);
    state.ensure_embedding(&fixture.cx(), root, 0, 1, None).unwrap();
    assert_eq!(kind(&state, &fixture), None);
}

#[test]
fn nothing_to_check_when_inactive_or_unbuilt() {
    let fixture = Fixture::new("a");
    assert_eq!(check(&HierarchyState::new(), &fixture.cx(), true, 0), None);
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state.list_mut(root).entry_mut(0).lookahead = 9;
    assert_eq!(check(&state, &fixture.cx(), false, 0), None);
}

#[test]
fn lock_violations_come_first() {
    let fixture = Fixture::new("a");
    let (state, _) = built(&fixture, &fixture.languages.calc);
    let found = check(&state, &fixture.cx(), true, 2).unwrap();
    assert_eq!(found.kind, DiagnosticKind::LockNotHeld);
    assert_eq!(found.actual, "2 violations");
}

#[test]
fn stale_lookahead_is_reported() {
    let fixture = Fixture::new("a+b");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state.list_mut(root).entry_mut(1).lookahead = 4;
    assert_eq!(
        kind(&state, &fixture),
        Some((DiagnosticKind::LookaheadMismatch, Some(1)))
    );
}

#[test]
fn stale_state_is_reported() {
    let fixture = Fixture::new("a+b");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state.list_mut(root).entry_mut(2).state = LexerState::small(calc::IN_COMMENT);
    assert_eq!(
        kind(&state, &fixture),
        Some((DiagnosticKind::StateMismatch, Some(2)))
    );
}

#[test]
fn wrong_token_is_a_batch_mismatch() {
    let fixture = Fixture::new("a+b");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state
        .list_mut(root)
        .replace_token(2, Token::new(calc::NUMBER, 1), 0);
    let found = check(&state, &fixture.cx(), true, 0).unwrap();
    assert_eq!(found.kind, DiagnosticKind::BatchMismatch);
    assert_eq!(found.index, Some(2));
    assert_eq!(found.expected, "IDENTIFIER@2+1");
    assert_eq!(found.actual, "NUMBER@2+1");
}

#[test]
fn length_must_match_the_text() {
    let fixture = Fixture::new("a+b");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state
        .list_mut(root)
        .replace_token(2, Token::new(calc::IDENTIFIER, 2), 1);
    let found = check(&state, &fixture.cx(), true, 0).unwrap();
    assert_eq!(found.kind, DiagnosticKind::LengthSum);
    assert_eq!(found.expected, "3");
    assert_eq!(found.actual, "4");
}

#[test]
fn unfinished_update_is_reported() {
    let fixture = Fixture::new("a");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    state.list_mut(root).status = ListStatus::Broken;
    assert_eq!(
        kind(&state, &fixture),
        Some((DiagnosticKind::BatchMismatch, None))
    );
}

#[test]
fn embedded_list_must_fill_its_host() {
    let fixture = Fixture::new("x+\"ab\"");
    let (mut state, root) = built(&fixture, &fixture.languages.calc);
    let child = state
        .ensure_embedding(&fixture.cx(), root, 0, 2, None)
        .unwrap()
        .unwrap();
    state.list_mut(child).link.as_mut().unwrap().spec.end_skip = 0;
    assert_eq!(
        kind(&state, &fixture),
        Some((DiagnosticKind::EmbeddingOutOfHost, Some(2)))
    );
}

#[test]
fn joined_sections_must_chain_states() {
    let fixture = Fixture::new("<% a /* %>x<% */ b %>");
    let (mut state, root) = built(&fixture, &fixture.languages.tmpl);
    state.ensure_embedding(&fixture.cx(), root, 0, 1, None).unwrap();
    let second = state
        .joined_section(root, 5, &fixture.languages.calc)
        .unwrap();
    state.list_mut(second).start_state = LexerState::Default;
    let found = check(&state, &fixture.cx(), true, 0).unwrap();
    assert_eq!(found.kind, DiagnosticKind::JoinStateMismatch);
    assert_eq!(found.index, Some(5));
    assert_eq!(found.path, "text/x-tmpl/text/x-calc");
}

#[test]
fn diagnostics_display_their_location() {
    let found = ConsistencyDiagnostic {
        path: "text/x-calc".to_owned(),
        kind: DiagnosticKind::OffsetMismatch,
        index: Some(3),
        expected: "4".to_owned(),
        actual: "5".to_owned(),
    };
    assert_eq!(
        found.to_string(),
        "OffsetMismatch in `text/x-calc` at token 3: expected 4, found 5"
    );
}
