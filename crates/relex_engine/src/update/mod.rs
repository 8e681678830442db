//! Incremental relexing of token lists after a text edit.
//!
//! # Algorithm
//!
//! For one list and an edit in its content coordinates:
//!
//! 1. **Validate**: an edit strictly inside one buffer-backed token whose
//!    id has a [`TokenValidator`](relex_lang::TokenValidator) may be patched
//!    by the validator without running the lexer.
//! 2. **Restart point**: starting at the first token ending after the edit,
//!    walk back over every token whose lookahead reaches the edit. The lexer
//!    resumes at the end of the token before the first such token, in the
//!    state recorded there, with the flyweight run recorded there.
//! 3. **Relex** token by token. Once a new token ends at or after the end of
//!    the inserted text, it is compared with the old token ending at the
//!    same place in old coordinates: equal id, length, part, state and
//!    flyweight run mean the old suffix is still valid and relexing stops.
//! 4. **Splice** the new tokens over the old range.
//! 5. **Children**: lists hosted by removed tokens move to the equivalent
//!    new token when one exists, updated in place when the edit fell inside
//!    their content; otherwise they are torn down.
//! 6. **Joined chains**: sections of a joined language after the restart
//!    point whose start state no longer matches the end state of the
//!    previous section are relexed, cascading until states agree again.
//!
//! # Key Types
//!
//! - [`UpdateLog`]: change records and cascade count collected during one
//!   hierarchy operation

use relex_ir::incremental::TextChange;
use relex_ir::{LexerState, Span, Token};
use relex_lang::{Language, ValidationEdit};

use crate::event::TokenListChange;
use crate::hierarchy::HierarchyState;
use crate::lexing::{LexContext, LexRun, Produced};
use crate::list::{LexedEntry, ListFlags, ListId, ListStatus, RemovedEntry, TokenList};
use crate::TokenHierarchyError;

/// What one hierarchy operation changed.
#[derive(Debug, Default)]
pub(crate) struct UpdateLog {
    pub changes: Vec<TokenListChange>,
    pub join_cascades: u32,
}

/// Outcome of the scanning phase.
struct Scan {
    start: usize,
    /// One past the last old token replaced.
    removed_end: usize,
    added: Vec<LexedEntry>,
    /// Set when the run reached the end of the content.
    trailing_skip: Option<u32>,
    /// Offset the run started at.
    restart_offset: u32,
}

/// Relex a list after `change`, given in the list's content coordinates.
///
/// `base` is the absolute offset of the list's content in the new text.
/// `start_state` forces a relex from the list start in a new state, for
/// joined sections whose predecessor changed.
#[allow(
    clippy::too_many_arguments,
    reason = "recursion threads the arena, context and log explicitly"
)]
pub(crate) fn update_list(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    id: ListId,
    base: u32,
    change: TextChange,
    start_state: Option<LexerState>,
    bounds_change: bool,
    log: &mut UpdateLog,
) -> Result<(), TokenHierarchyError> {
    let forced = start_state.is_some();
    let list = state.list_mut(id);
    if let Some(start_state) = start_state {
        list.start_state = start_state;
    }
    let path = list.path.clone();
    let new_len = u32::try_from(i64::from(list.text_len()) + change.delta()).map_err(|_| {
        TokenHierarchyError::InvalidModification {
            offset: base + change.start,
            removed: change.old_len(),
            text_len: list.text_len(),
        }
    })?;
    let content = cx.content(&path, base, new_len)?;

    if !forced && validate(state, cx, id, base, content, change, bounds_change, log)? {
        return Ok(());
    }

    state.list_mut(id).status = ListStatus::Scanning;
    let scan = match scan(state.list(id), cx, base, content, change, forced) {
        Ok(scan) => scan,
        Err(error) => {
            state.list_mut(id).status = ListStatus::Broken;
            return Err(error);
        }
    };

    let list = state.list_mut(id);
    list.status = ListStatus::Splicing;
    let removed_end = if scan.removed_end > scan.start {
        list.end(scan.removed_end - 1)
    } else {
        scan.restart_offset
    };
    let added_end = scan.added.last().map_or(scan.restart_offset, LexedEntry::end);
    let added: Vec<Token> = scan.added.iter().map(|entry| entry.token.clone()).collect();
    let added_len = added.len();
    let removed = list.splice(
        scan.start..scan.removed_end,
        scan.added,
        change.delta(),
        scan.trailing_skip,
    );
    list.status = ListStatus::Stable;
    tracing::debug!(
        path = %path,
        index = scan.start,
        removed = removed.len(),
        added = added_len,
        "tokens spliced"
    );

    log.changes.push(TokenListChange {
        path,
        index: scan.start,
        offset: base + scan.restart_offset,
        removed: removed.iter().map(|r| r.entry.token.clone()).collect(),
        added,
        removed_end: base + removed_end,
        added_end: base + added_end,
        bounds_change,
    });

    transfer_children(state, cx, id, base, change, scan.start, added_len, removed, log)?;
    repair_join_chains(state, cx, id, base, scan.start, scan.start + added_len, log)
}

/// Relex from the restart point until the old tokens line up again.
fn scan(
    list: &TokenList,
    cx: &LexContext<'_>,
    base: u32,
    content: &str,
    change: TextChange,
    forced: bool,
) -> Result<Scan, TokenHierarchyError> {
    let count = list.len();
    let start = if forced {
        0
    } else {
        let anchor = list.first_ending_after(change.start);
        list.relex_start(anchor, change.start)
    };
    let (restart_offset, restart_state, flyweight_run) = if start == 0 {
        (0, list.start_state.clone(), 0)
    } else {
        (
            list.end(start - 1),
            list.state_after(start - 1).clone(),
            list.flyweight_run_before(start),
        )
    };
    tracing::debug!(
        path = %list.path,
        index = start,
        offset = base + restart_offset,
        forced,
        "relex started"
    );

    let mut run = LexRun::new(
        cx,
        &list.path,
        content,
        base,
        restart_offset,
        &restart_state,
        flyweight_run,
    );
    let stop_from = change.new_end();
    let delta = change.delta();
    let mut added = Vec::new();
    let mut candidate = start;
    loop {
        match run.next()? {
            Produced::Token(entry) => {
                let end = entry.end();
                if end >= stop_from {
                    let old_end = i64::from(end) - delta;
                    while candidate < count && i64::from(list.end(candidate)) < old_end {
                        candidate += 1;
                    }
                    if candidate < count
                        && i64::from(list.end(candidate)) == old_end
                        && same_token(list, candidate, &entry)
                    {
                        tracing::trace!(index = candidate, "relex converged");
                        added.push(entry);
                        return Ok(Scan {
                            start,
                            removed_end: candidate + 1,
                            added,
                            trailing_skip: None,
                            restart_offset,
                        });
                    }
                }
                added.push(entry);
            }
            Produced::End { trailing_skip } => {
                return Ok(Scan {
                    start,
                    removed_end: count,
                    added,
                    trailing_skip: Some(trailing_skip),
                    restart_offset,
                });
            }
        }
    }
}

/// The lexer would continue after `entry` exactly as it did after the old
/// token at `index`.
fn same_token(list: &TokenList, index: usize, entry: &LexedEntry) -> bool {
    let old = list.entry(index);
    old.token.id() == entry.token.id()
        && old.token.len() == entry.token.len()
        && old.token.part() == entry.token.part()
        && old.state == entry.state
        && list.flyweight_run_before(index + 1) == entry.flyweight_run
}

// === Validation fast path ===

/// Token index and validator replacement for an edit strictly inside one
/// token, if the token's validator accepts it.
fn validated(
    list: &TokenList,
    content: &str,
    change: TextChange,
    limit: u32,
) -> Option<(usize, Token)> {
    if change.old_len() > limit || change.new_len > limit {
        return None;
    }
    let index = list.first_ending_after(change.start);
    if index >= list.len() {
        return None;
    }
    let offset = list.offset(index);
    let token = list.token(index);
    if token.is_flyweight() || offset >= change.start || change.old_end >= list.end(index) {
        return None;
    }
    let validator = list.path.inner_language().validator(token.id())?;
    // Earlier tokens whose lookahead reaches the edit need the lexer.
    if list.relex_start(index, change.start) != index {
        return None;
    }
    let new_len = u32::try_from(i64::from(token.len()) + change.delta()).ok()?;
    let text = content.get(offset as usize..(offset + new_len) as usize)?;
    let edit = ValidationEdit {
        token,
        text,
        offset: change.start - offset,
        removed: change.old_len(),
        inserted: change.new_len,
    };
    let Some(replacement) = validator.validate(&edit) else {
        tracing::trace!(token = %token.id(), "validator declined");
        return None;
    };
    if replacement.is_flyweight() || replacement.len() != new_len {
        tracing::debug!(
            token = %token.id(),
            len = replacement.len(),
            expected = new_len,
            "validator result rejected"
        );
        return None;
    }
    Some((index, replacement))
}

#[allow(
    clippy::too_many_arguments,
    reason = "mirrors update_list"
)]
fn validate(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    id: ListId,
    base: u32,
    content: &str,
    change: TextChange,
    bounds_change: bool,
    log: &mut UpdateLog,
) -> Result<bool, TokenHierarchyError> {
    let Some((index, replacement)) = validated(
        state.list(id),
        content,
        change,
        cx.config.validation_edit_limit,
    ) else {
        return Ok(false);
    };

    let list = state.list_mut(id);
    let offset = list.offset(index);
    let added_end = offset + replacement.len();
    let removed = list.replace_token(index, replacement.clone(), change.delta());
    tracing::debug!(path = %list.path, index, token = %replacement.id(), "token validated");
    log.changes.push(TokenListChange {
        path: list.path.clone(),
        index,
        offset: base + offset,
        removed: vec![removed.entry.token.clone()],
        added: vec![replacement],
        removed_end: base + removed.end(),
        added_end: base + added_end,
        bounds_change,
    });

    transfer_children(state, cx, id, base, change, index, 1, vec![removed], log)?;
    repair_join_chains(state, cx, id, base, index, index + 1, log)?;
    Ok(true)
}

// === Embedded lists ===

/// Where a child list of a removed token may live on.
#[derive(Clone, Copy, Debug)]
struct Placement {
    host: Span,
    /// Edit to apply to the child, in its content coordinates.
    edit: Option<TextChange>,
}

/// Candidate placements for a child of the removed token at `host`, most
/// specific last: unchanged before or after the edit, then resized around it.
fn placements(host: Span, start_skip: u32, end_skip: u32, change: TextChange) -> Vec<Placement> {
    let mut found = Vec::with_capacity(2);
    if change.keeps_before(host) {
        found.push(Placement { host, edit: None });
    } else if change.keeps_after(host) {
        if let Some(start) = change.moved_offset(host.start) {
            found.push(Placement {
                host: Span::with_len(start, host.len()),
                edit: None,
            });
        }
    }
    let content = Span::new(host.start + start_skip, host.end.saturating_sub(end_skip));
    if content.contains_span(change.old_span()) {
        if let Ok(new_len) = u32::try_from(i64::from(host.len()) + change.delta()) {
            found.push(Placement {
                host: Span::with_len(host.start, new_len),
                edit: Some(change.relative_to(content.start)),
            });
        }
    }
    found
}

/// Index of the newly added token covering `host` with the removed
/// token's id.
fn new_host(
    list: &TokenList,
    added: std::ops::Range<usize>,
    host: Span,
    removed: &Token,
) -> Option<usize> {
    let index = list.token_index_at(host.start)?;
    let token = list.token(index);
    (added.contains(&index)
        && list.offset(index) == host.start
        && token.len() == host.len()
        && token.id() == removed.id()
        && !token.is_flyweight())
    .then_some(index)
}

#[allow(
    clippy::too_many_arguments,
    reason = "mirrors update_list"
)]
fn transfer_children(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    id: ListId,
    base: u32,
    change: TextChange,
    first_added: usize,
    added_len: usize,
    removed: Vec<RemovedEntry>,
    log: &mut UpdateLog,
) -> Result<(), TokenHierarchyError> {
    let added = first_added..first_added + added_len;
    for RemovedEntry { offset, entry } in removed {
        for child in entry.embeddings {
            let (spec, custom) = match &state.list(child).link {
                Some(link) => (
                    link.spec.clone(),
                    state.list(child).flags.contains(ListFlags::CUSTOM),
                ),
                None => {
                    debug_assert!(false, "embedded list without link");
                    continue;
                }
            };
            let mut target = None;
            let host = Span::with_len(offset, entry.token.len());
            for placement in placements(host, spec.start_skip, spec.end_skip, change) {
                let list = state.list(id);
                let Some(index) = new_host(list, added.clone(), placement.host, &entry.token)
                else {
                    continue;
                };
                let taken = list
                    .entry(index)
                    .embeddings
                    .iter()
                    .any(|&other| state.list(other).path.inner_language() == &spec.language);
                let compatible = !taken
                    && if custom {
                        spec.fits(placement.host.len())
                    } else {
                        state.resolve_default(cx, id, base, index).as_ref() == Some(&spec)
                    };
                if compatible {
                    target = Some((index, placement));
                    break;
                }
            }

            let Some((index, placement)) = target else {
                tracing::debug!(path = %state.list(child).path, "embedded list torn down");
                state.free_tree(child);
                continue;
            };
            state.list_mut(id).entry_mut(index).embeddings.push(child);
            if let Some(edit) = placement.edit {
                let child_base = state.content_base(id, base, index, spec.start_skip);
                update_list(state, cx, child, child_base, edit, None, true, log)?;
            }
        }
    }
    Ok(())
}

fn repair_join_chains(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    id: ListId,
    base: u32,
    from: usize,
    changed_until: usize,
    log: &mut UpdateLog,
) -> Result<(), TokenHierarchyError> {
    let joined = state.list(id).joined.clone();
    for language in &joined {
        repair_join_chain(state, cx, id, base, language, from, changed_until, log)?;
    }
    Ok(())
}

/// Restore the joined chain of `language` under `parent` from token
/// `from` on.
///
/// Hosts in `from..changed_until` without a section get one. A section
/// whose start state differs from the end state of the section before it
/// is relexed from its start. Past `changed_until`, the first section that
/// already starts in the right state ends the walk.
#[allow(
    clippy::too_many_arguments,
    reason = "mirrors update_list"
)]
pub(crate) fn repair_join_chain(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    parent: ListId,
    base: u32,
    language: &Language,
    from: usize,
    changed_until: usize,
    log: &mut UpdateLog,
) -> Result<(), TokenHierarchyError> {
    let mut previous_end = (0..from)
        .rev()
        .find_map(|index| state.joined_section(parent, index, language))
        .map_or(LexerState::Default, |section| {
            state.list(section).end_state().clone()
        });

    let count = state.list(parent).len();
    for index in from..count {
        match state.joined_section(parent, index, language) {
            None => {
                if index >= changed_until {
                    continue;
                }
                let Some(spec) = state.resolve_default(cx, parent, base, index) else {
                    continue;
                };
                if !spec.join_sections || spec.language != *language {
                    continue;
                }
                let section = state.create_embedded(
                    cx,
                    parent,
                    base,
                    index,
                    spec,
                    previous_end,
                    ListFlags::JOINED,
                )?;
                previous_end = state.list(section).end_state().clone();
            }
            Some(section) => {
                let list = state.list(section);
                if list.start_state != previous_end {
                    let start_skip = list.link.as_ref().map_or(0, |link| link.spec.start_skip);
                    let section_base = state.content_base(parent, base, index, start_skip);
                    tracing::debug!(
                        path = %list.path,
                        offset = section_base,
                        "joined section restarted"
                    );
                    log.join_cascades += 1;
                    update_list(
                        state,
                        cx,
                        section,
                        section_base,
                        TextChange::new(0, 0, 0),
                        Some(previous_end),
                        false,
                        log,
                    )?;
                } else if index >= changed_until {
                    return Ok(());
                }
                previous_end = state.list(section).end_state().clone();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
