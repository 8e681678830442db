//! Structural checks over the built token lists.
//!
//! Used by tests and the `relex check` command after edit sequences. Every
//! list is compared with a fresh lexing run of its content, so the checker
//! also catches incremental results that differ from batch lexing.

use std::fmt;

use relex_ir::LexerState;
use relex_lang::Language;

use crate::hierarchy::HierarchyState;
use crate::lexing::{lex_all, LexContext};
use crate::list::{ListFlags, ListId, ListStatus, TokenList};

/// Which invariant a [`ConsistencyDiagnostic`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Token lengths and skips do not add up to the covered length.
    LengthSum,
    OffsetMismatch,
    /// An embedded list does not fit inside its host token.
    EmbeddingOutOfHost,
    /// Tokens differ from a batch lexing run of the same content.
    BatchMismatch,
    LookaheadMismatch,
    StateMismatch,
    /// A joined section does not start in the end state of the previous one.
    JoinStateMismatch,
    /// Operations ran without the input lock.
    LockNotHeld,
}

/// First broken invariant found by [`TokenHierarchy::check_consistency`].
///
/// [`TokenHierarchy::check_consistency`]: crate::TokenHierarchy::check_consistency
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyDiagnostic {
    /// Mime path of the offending list.
    pub path: String,
    pub kind: DiagnosticKind,
    /// Offending token, when the problem is local to one.
    pub index: Option<usize>,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for ConsistencyDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in `{}`", self.kind, self.path)?;
        if let Some(index) = self.index {
            write!(f, " at token {index}")?;
        }
        write!(f, ": expected {}, found {}", self.expected, self.actual)
    }
}

impl std::error::Error for ConsistencyDiagnostic {}

fn diagnostic(
    list: &TokenList,
    kind: DiagnosticKind,
    index: Option<usize>,
    expected: impl ToString,
    actual: impl ToString,
) -> ConsistencyDiagnostic {
    ConsistencyDiagnostic {
        path: list.path.mime_path().to_owned(),
        kind,
        index,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

pub(crate) fn check(
    state: &HierarchyState,
    cx: &LexContext<'_>,
    active: bool,
    lock_violations: u32,
) -> Option<ConsistencyDiagnostic> {
    if lock_violations > 0 {
        return Some(ConsistencyDiagnostic {
            path: String::new(),
            kind: DiagnosticKind::LockNotHeld,
            index: None,
            expected: "0 violations".to_owned(),
            actual: format!("{lock_violations} violations"),
        });
    }
    if !active {
        return None;
    }
    let root = state.root?;
    let text_len = u32::try_from(cx.text.len()).unwrap_or(u32::MAX);
    let root_list = state.list(root);
    if root_list.text_len() != text_len {
        return Some(diagnostic(
            root_list,
            DiagnosticKind::LengthSum,
            None,
            text_len,
            root_list.text_len(),
        ));
    }

    let mut pending = vec![(root, 0)];
    while let Some((id, base)) = pending.pop() {
        let list = state.list(id);
        if list.status != ListStatus::Stable {
            return Some(diagnostic(
                list,
                DiagnosticKind::BatchMismatch,
                None,
                format!("{:?}", ListStatus::Stable),
                format!("{:?}", list.status),
            ));
        }
        if let Some(found) = check_offsets(list)
            .or_else(|| check_batch(list, cx, base))
            .or_else(|| check_joins(state, list))
        {
            return Some(found);
        }
        for (index, entry) in list.entries() {
            for &child in &entry.embeddings {
                let child_list = state.list(child);
                let Some(link) = &child_list.link else {
                    return Some(diagnostic(
                        child_list,
                        DiagnosticKind::EmbeddingOutOfHost,
                        Some(index),
                        "link to host list",
                        "none",
                    ));
                };
                let host_len = entry.token.len();
                let skips = link.spec.start_skip + link.spec.end_skip;
                if link.parent != id || skips + child_list.text_len() != host_len {
                    return Some(diagnostic(
                        child_list,
                        DiagnosticKind::EmbeddingOutOfHost,
                        Some(index),
                        host_len,
                        skips + child_list.text_len(),
                    ));
                }
                pending.push((child, base + list.offset(index) + link.spec.start_skip));
            }
        }
    }
    None
}

fn check_offsets(list: &TokenList) -> Option<ConsistencyDiagnostic> {
    let mut expected = 0;
    for (index, entry) in list.entries() {
        expected += entry.skipped_before;
        let actual = list.offset(index);
        if actual != expected {
            return Some(diagnostic(
                list,
                DiagnosticKind::OffsetMismatch,
                Some(index),
                expected,
                actual,
            ));
        }
        expected += entry.token.len();
    }
    let total = expected + list.trailing_skip();
    (total != list.text_len()).then(|| {
        diagnostic(
            list,
            DiagnosticKind::LengthSum,
            None,
            list.text_len(),
            total,
        )
    })
}

fn check_batch(list: &TokenList, cx: &LexContext<'_>, base: u32) -> Option<ConsistencyDiagnostic> {
    let batch = cx
        .content(&list.path, base, list.text_len())
        .and_then(|content| lex_all(cx, &list.path, content, base, &list.start_state));
    let batch = match batch {
        Ok(batch) => batch,
        Err(error) => {
            return Some(diagnostic(
                list,
                DiagnosticKind::BatchMismatch,
                None,
                "successful lexing run",
                error,
            ))
        }
    };
    if batch.entries.len() != list.len() {
        return Some(diagnostic(
            list,
            DiagnosticKind::BatchMismatch,
            None,
            format!("{} tokens", batch.entries.len()),
            format!("{} tokens", list.len()),
        ));
    }
    for (expected, (index, entry)) in batch.entries.iter().zip(list.entries()) {
        let token = &entry.token;
        let same = expected.token.id() == token.id()
            && expected.token.len() == token.len()
            && expected.token.part() == token.part()
            && expected.token.is_flyweight() == token.is_flyweight()
            && expected.offset == list.offset(index);
        if !same {
            return Some(diagnostic(
                list,
                DiagnosticKind::BatchMismatch,
                Some(index),
                format!("{}@{}+{}", expected.token.id(), expected.offset, expected.token.len()),
                format!("{}@{}+{}", token.id(), list.offset(index), token.len()),
            ));
        }
        if expected.lookahead != entry.lookahead {
            return Some(diagnostic(
                list,
                DiagnosticKind::LookaheadMismatch,
                Some(index),
                expected.lookahead,
                entry.lookahead,
            ));
        }
        if expected.state != entry.state {
            return Some(diagnostic(
                list,
                DiagnosticKind::StateMismatch,
                Some(index),
                format!("{:?}", expected.state),
                format!("{:?}", entry.state),
            ));
        }
    }
    (batch.trailing_skip != list.trailing_skip()).then(|| {
        diagnostic(
            list,
            DiagnosticKind::BatchMismatch,
            None,
            format!("trailing skip {}", batch.trailing_skip),
            format!("trailing skip {}", list.trailing_skip()),
        )
    })
}

fn check_joins(state: &HierarchyState, list: &TokenList) -> Option<ConsistencyDiagnostic> {
    for language in &list.joined {
        let mut previous_end = LexerState::Default;
        for (index, child) in sections(state, list, language) {
            let section = state.list(child);
            if section.start_state != previous_end {
                return Some(diagnostic(
                    section,
                    DiagnosticKind::JoinStateMismatch,
                    Some(index),
                    format!("{previous_end:?}"),
                    format!("{:?}", section.start_state),
                ));
            }
            previous_end = section.end_state().clone();
        }
    }
    None
}

/// Joined sections of `language` hosted by `list`, with host indexes.
fn sections<'s>(
    state: &'s HierarchyState,
    list: &'s TokenList,
    language: &'s Language,
) -> impl Iterator<Item = (usize, ListId)> + 's {
    list.entries().flat_map(move |(index, entry)| {
        entry
            .embeddings
            .iter()
            .copied()
            .filter(move |&child| {
                let section = state.list(child);
                section.flags.contains(ListFlags::JOINED)
                    && section.path.inner_language() == language
            })
            .map(move |child| (index, child))
    })
}

#[cfg(test)]
mod tests;
