#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;
use relex_ir::PartType;
use relex_langs::calc;

use crate::consistency;
use crate::test_support::Fixture;

struct Doc {
    fixture: Fixture,
    state: HierarchyState,
    root: ListId,
}

impl Doc {
    fn new(text: &str, language: fn(&Fixture) -> &Language) -> Doc {
        let fixture = Fixture::new(text);
        let mut state = HierarchyState::new();
        let root = state.build_root(&fixture.cx(), language(&fixture)).unwrap();
        Doc {
            fixture,
            state,
            root,
        }
    }

    fn calc(text: &str) -> Doc {
        Doc::new(text, |fixture| &fixture.languages.calc)
    }

    fn tmpl(text: &str) -> Doc {
        Doc::new(text, |fixture| &fixture.languages.tmpl)
    }

    fn edit(&mut self, offset: u32, remove: u32, insert: &str) -> Result<UpdateLog, TokenHierarchyError> {
        let start = offset as usize;
        self.fixture
            .text
            .replace_range(start..start + remove as usize, insert);
        let change = TextChange::replace(offset, remove, u32::try_from(insert.len()).unwrap());
        let mut log = UpdateLog::default();
        let cx = self.fixture.cx();
        update_list(&mut self.state, &cx, self.root, 0, change, None, false, &mut log)?;
        Ok(log)
    }

    fn embed(&mut self, index: usize) -> ListId {
        let cx = self.fixture.cx();
        self.state
            .ensure_embedding(&cx, self.root, 0, index, None)
            .unwrap()
            .unwrap()
    }

    fn names(&self, id: ListId) -> Vec<(&'static str, u32)> {
        let list = self.state.list(id);
        (0..list.len())
            .map(|i| (list.token(i).id().name(), list.offset(i)))
            .collect()
    }

    fn assert_consistent(&self) {
        let found = consistency::check(&self.state, &self.fixture.cx(), true, 0);
        assert_eq!(found, None);
    }
}

fn ids(tokens: &[Token]) -> Vec<&'static str> {
    tokens.iter().map(|token| token.id().name()).collect()
}

#[test]
fn relex_restarts_at_the_token_that_looked_ahead() {
    let mut doc = Doc::calc("a+bb");
    let log = doc.edit(2, 0, "+").unwrap();
    assert_eq!(
        doc.names(doc.root),
        vec![("IDENTIFIER", 0), ("INCREMENT", 1), ("IDENTIFIER", 3)]
    );
    assert_eq!(log.changes.len(), 1);
    let change = &log.changes[0];
    assert_eq!(change.index, 1);
    assert_eq!(change.offset, 1);
    assert_eq!(ids(&change.removed), vec!["PLUS", "IDENTIFIER"]);
    assert_eq!(ids(&change.added), vec!["INCREMENT", "IDENTIFIER"]);
    assert_eq!(change.removed_end, 4);
    assert_eq!(change.added_end, 5);
    doc.assert_consistent();
}

#[test]
fn relex_stops_once_tokens_line_up() {
    let mut doc = Doc::calc("a + b + c + d");
    doc.fixture.languages.reset_stats();
    let log = doc.edit(4, 1, "bb").unwrap();
    let change = &log.changes[0];
    // The space before the edit peeked at it.
    assert_eq!(change.index, 3);
    assert_eq!(ids(&change.added), vec!["WHITESPACE", "IDENTIFIER", "WHITESPACE"]);
    assert_eq!(doc.fixture.languages.calc_stats.tokens_lexed(), 3);
    doc.assert_consistent();
}

#[test]
fn validator_patches_the_token_without_lexing() {
    let mut doc = Doc::calc("abc+d");
    doc.fixture.languages.reset_stats();
    let log = doc.edit(1, 0, "x").unwrap();
    assert_eq!(doc.fixture.languages.calc_stats.tokens_lexed(), 0);
    assert_eq!(
        doc.names(doc.root),
        vec![("IDENTIFIER", 0), ("PLUS", 4), ("IDENTIFIER", 5)]
    );
    let change = &log.changes[0];
    assert_eq!(change.index, 0);
    assert_eq!(change.removed[0].len(), 3);
    assert_eq!(change.added[0].len(), 4);
    doc.assert_consistent();
}

#[test]
fn rejected_validation_falls_back_to_lexing() {
    let mut doc = Doc::calc("abc+d");
    doc.edit(1, 0, " ").unwrap();
    assert_eq!(
        doc.names(doc.root),
        vec![
            ("IDENTIFIER", 0),
            ("WHITESPACE", 1),
            ("IDENTIFIER", 2),
            ("PLUS", 4),
            ("IDENTIFIER", 5),
        ]
    );
    doc.assert_consistent();
}

#[test]
fn opening_a_comment_changes_state_until_it_closes() {
    let mut doc = Doc::calc("a */ b");
    doc.edit(0, 0, "/*").unwrap();
    assert_eq!(
        doc.names(doc.root),
        vec![("COMMENT", 0), ("WHITESPACE", 6), ("IDENTIFIER", 7)]
    );
    doc.assert_consistent();

    doc.edit(0, 2, "").unwrap();
    assert_eq!(doc.names(doc.root)[0], ("IDENTIFIER", 0));
    doc.assert_consistent();
}

#[test]
fn embedded_list_is_updated_in_place() {
    let mut doc = Doc::calc("x+\"ab\"");
    let child = doc.embed(2);
    let log = doc.edit(4, 0, "\\n").unwrap();
    assert_eq!(doc.state.list(doc.root).entry(2).embeddings.as_slice(), &[child]);
    assert_eq!(
        doc.names(child),
        vec![("TEXT", 0), ("ESCAPE", 1), ("TEXT", 3)]
    );
    assert_eq!(log.changes.len(), 2);
    assert!(!log.changes[0].bounds_change);
    assert!(log.changes[1].bounds_change);
    assert_eq!(log.changes[1].offset, 3);
    doc.assert_consistent();
}

#[test]
fn embedded_list_goes_when_its_host_loses_a_skip() {
    let mut doc = Doc::calc("x+\"ab\"");
    doc.embed(2);
    doc.edit(5, 1, "").unwrap();
    assert_eq!(doc.state.live_lists(), 1);
    assert_eq!(doc.state.list(doc.root).token(2).part(), PartType::Start);

    let child = doc.embed(2);
    assert_eq!(doc.state.list(child).text_len(), 2);
    doc.assert_consistent();
}

#[test]
fn embedded_list_survives_edits_elsewhere() {
    let mut doc = Doc::calc("x+\"ab\"");
    let child = doc.embed(2);
    doc.edit(0, 1, "long").unwrap();
    let list = doc.state.list(doc.root);
    assert_eq!(list.entry(2).embeddings.as_slice(), &[child]);
    assert_eq!(doc.state.content_base(doc.root, 0, 2, 1), 6);
    doc.assert_consistent();
}

#[test]
fn joined_sections_cascade_state_changes() {
    let mut doc = Doc::tmpl("<% a %>x<% b %>");
    let first = doc.embed(1);
    let second = doc.state.joined_section(doc.root, 5, &doc.fixture.languages.calc).unwrap();

    let log = doc.edit(4, 0, "/*").unwrap();
    assert_eq!(log.join_cascades, 1);
    assert_eq!(
        doc.state.list(first).end_state(),
        &LexerState::small(calc::IN_COMMENT)
    );
    let section = doc.state.list(second);
    assert_eq!(section.start_state, LexerState::small(calc::IN_COMMENT));
    assert_eq!(section.len(), 1);
    assert_eq!(section.token(0).part(), PartType::Middle);
    doc.assert_consistent();

    let log = doc.edit(4, 2, "").unwrap();
    assert_eq!(log.join_cascades, 1);
    assert_eq!(
        doc.names(second),
        vec![("WHITESPACE", 0), ("IDENTIFIER", 1), ("WHITESPACE", 2)]
    );
    doc.assert_consistent();
}

#[test]
fn edits_outside_the_chain_do_not_cascade() {
    let mut doc = Doc::tmpl("<% a /* %>x<% */ b %>");
    doc.embed(1);
    let log = doc.edit(10, 1, "yy").unwrap();
    assert_eq!(log.join_cascades, 0);
    doc.assert_consistent();
}

#[test]
fn modification_larger_than_the_list_is_rejected() {
    let mut doc = Doc::calc("abc");
    let change = TextChange::delete(1, 5);
    let mut log = UpdateLog::default();
    let cx = doc.fixture.cx();
    let error = update_list(&mut doc.state, &cx, doc.root, 0, change, None, false, &mut log)
        .unwrap_err();
    assert!(matches!(error, TokenHierarchyError::InvalidModification { .. }));
}
