//! The token hierarchy: the root token list of an input plus every
//! embedded list, kept in sync with the input through
//! [`TokenHierarchy::text_modified`].
//!
//! # Locking
//!
//! Modifications take `&mut self`. Queries take `&self` and may run on
//! several threads at once; lists they need are built lazily under an
//! internal lock. The input owner's reader/writer lock is only consulted
//! through the [`MutableTextInput`] predicates, and a missing lock is
//! recorded for [`TokenHierarchy::check_consistency`] rather than refused.

mod arena;

pub(crate) use arena::HierarchyState;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashSet;

use relex_ir::incremental::TextChange;
use relex_ir::{LexerState, PartType};
use relex_lang::{EmbeddingResolver, EmbeddingSpec, Language, LanguagePath, LanguageProviders};

use crate::config::HierarchyConfig;
use crate::consistency::{self, ConsistencyDiagnostic};
use crate::event::{
    TokenHierarchyEvent, TokenHierarchyEventKind, TokenHierarchyListener, TokenListChange,
};
use crate::input::{MutableTextInput, TextDocument};
use crate::lexing::{LexContext, LexerPool};
use crate::list::{ListFlags, ListId};
use crate::sequence::{JoinedTokenSequence, TokenSequence};
use crate::update::{update_list, UpdateLog};
use crate::TokenHierarchyError;

/// One token of a [`TokenHierarchy::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRow {
    /// Mime path of the token's language path.
    pub path: String,
    pub id: &'static str,
    pub offset: u32,
    pub len: u32,
    pub part: PartType,
    pub lookahead: u32,
    pub state: LexerState,
}

fn lex_context<'a, I: MutableTextInput>(
    input: &'a I,
    resolver: &'a EmbeddingResolver,
    pool: &'a LexerPool,
    config: &'a HierarchyConfig,
) -> LexContext<'a> {
    LexContext {
        text: input.text(),
        attributes: input.input_attributes(),
        resolver,
        pool,
        config,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "inputs are bounded by u32 offsets"
)]
fn text_len(text: &str) -> u32 {
    text.len() as u32
}

/// Tokens of one input across every embedded language.
pub struct TokenHierarchy<I: MutableTextInput> {
    input: I,
    language: Language,
    state: RwLock<HierarchyState>,
    resolver: EmbeddingResolver,
    pool: LexerPool,
    config: HierarchyConfig,
    active: bool,
    listeners: Vec<Arc<dyn TokenHierarchyListener>>,
    lock_violations: AtomicU32,
}

impl<I: MutableTextInput> TokenHierarchy<I> {
    /// Active hierarchy over `input` in `language`, without language
    /// providers.
    pub fn new(input: I, language: Language) -> Self {
        Self::with_providers(input, language, Arc::new(LanguageProviders::new()))
    }

    pub fn with_providers(input: I, language: Language, providers: Arc<LanguageProviders>) -> Self {
        let config = HierarchyConfig::default();
        TokenHierarchy {
            input,
            language,
            state: RwLock::new(HierarchyState::new()),
            resolver: EmbeddingResolver::new(providers),
            pool: LexerPool::new(config.lexer_pool_capacity),
            config,
            active: true,
            listeners: Vec::new(),
            lock_violations: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: HierarchyConfig) -> Self {
        self.pool = LexerPool::new(config.lexer_pool_capacity);
        self.config = config;
        self.state.get_mut().clear();
        self
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Mutable access to the input. Every edit must be reported through
    /// [`text_modified`](Self::text_modified) before the next query.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn providers(&self) -> &Arc<LanguageProviders> {
        self.resolver.providers()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn TokenHierarchyListener>) {
        self.listeners.push(listener);
    }

    // === Lifecycle ===

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activate or deactivate. An inactive hierarchy holds no tokens and
    /// answers every query with nothing.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        self.state.get_mut().clear();
        tracing::debug!(active, "token hierarchy activity changed");
        self.fire(&TokenHierarchyEvent::global(
            TokenHierarchyEventKind::Activity,
            text_len(self.input.text()),
        ));
    }

    /// Drop every token list; the next query relexes from scratch.
    pub fn rebuild(&mut self) {
        self.state.get_mut().clear();
        tracing::debug!("token hierarchy rebuilt");
        self.fire(&TokenHierarchyEvent::global(
            TokenHierarchyEventKind::Rebuild,
            text_len(self.input.text()),
        ));
    }

    /// Forget all embedding decisions and drop every embedded list that
    /// came from them. Custom embeddings survive.
    pub fn invalidate_embeddings(&mut self) {
        self.resolver.invalidate();
        let dropped = self.state.get_mut().drop_default_embeddings();
        tracing::debug!(dropped, "embeddings invalidated");
        self.fire(&TokenHierarchyEvent::global(
            TokenHierarchyEventKind::EmbeddingsInvalidated,
            text_len(self.input.text()),
        ));
    }

    // === Modification ===

    /// Bring the tokens up to date after the input changed by `change`.
    ///
    /// Returns the event delivered to listeners, or `None` when there was
    /// nothing to update (inactive, or no tokens built yet). On error every
    /// list is dropped and rebuilt on the next query.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(offset = change.start, removed = change.old_len(), inserted = change.new_len)
    )]
    pub fn text_modified(
        &mut self,
        change: TextChange,
    ) -> Result<Option<TokenHierarchyEvent>, TokenHierarchyError> {
        self.check_write_lock("text_modified");
        if !self.active {
            return Ok(None);
        }
        let cx = lex_context(&self.input, &self.resolver, &self.pool, &self.config);
        let state = self.state.get_mut();
        let Some(root) = state.root else {
            return Ok(None);
        };
        let old_len = state.list(root).text_len();
        if !change.fits(old_len, text_len(cx.text)) {
            state.clear();
            return Err(TokenHierarchyError::InvalidModification {
                offset: change.start,
                removed: change.old_len(),
                text_len: old_len,
            });
        }

        let mut log = UpdateLog::default();
        if let Err(error) = update_list(state, &cx, root, 0, change, None, false, &mut log) {
            state.clear();
            return Err(error);
        }
        let event = TokenHierarchyEvent::new(
            TokenHierarchyEventKind::Modification,
            Some(change),
            log.changes,
            log.join_cascades,
        );
        tracing::debug!(
            lists = event.changes.len(),
            cascades = event.join_cascades,
            "modification applied"
        );
        self.fire(&event);
        Ok(Some(event))
    }

    /// Embed `language` in the token at `offset` of the list for `path`.
    ///
    /// Returns `false` when the token already hosts `language` or is a
    /// flyweight.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path, offset))]
    pub fn create_embedding(
        &mut self,
        path: &LanguagePath,
        offset: u32,
        language: Language,
        start_skip: u32,
        end_skip: u32,
    ) -> Result<bool, TokenHierarchyError> {
        self.check_write_lock("create_embedding");
        if !self.active {
            return Err(TokenHierarchyError::Inactive);
        }
        let cx = lex_context(&self.input, &self.resolver, &self.pool, &self.config);
        let state = self.state.get_mut();
        let created = create_custom(state, &cx, &self.language, path, offset, language, start_skip, end_skip);
        let change = match created {
            Ok(Some(change)) => change,
            Ok(None) => return Ok(false),
            Err(error @ (TokenHierarchyError::NoSuchToken { .. }
            | TokenHierarchyError::EmbeddingDoesNotFit { .. })) => return Err(error),
            Err(error) => {
                state.clear();
                return Err(error);
            }
        };
        let event = TokenHierarchyEvent::new(
            TokenHierarchyEventKind::EmbeddingCreated,
            None,
            vec![change],
            0,
        );
        self.fire(&event);
        Ok(true)
    }

    /// Remove a custom embedding of `language` from the token at `offset` of
    /// the list for `path`. Embeddings created by resolution are not
    /// removable; `false` is returned for them and for missing ones.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path, offset))]
    pub fn remove_embedding(
        &mut self,
        path: &LanguagePath,
        offset: u32,
        language: &Language,
    ) -> Result<bool, TokenHierarchyError> {
        self.check_write_lock("remove_embedding");
        if !self.active {
            return Err(TokenHierarchyError::Inactive);
        }
        let cx = lex_context(&self.input, &self.resolver, &self.pool, &self.config);
        let state = self.state.get_mut();
        let located = match locate_token(state, &cx, &self.language, path, offset) {
            Ok(located) => located,
            Err(error @ TokenHierarchyError::NoSuchToken { .. }) => return Err(error),
            Err(error) => {
                state.clear();
                return Err(error);
            }
        };
        let (parent, base, index) = located;
        let Some(child) = state.existing_embedding(parent, index, Some(language)) else {
            return Ok(false);
        };
        if !state.list(child).flags.contains(ListFlags::CUSTOM) {
            return Ok(false);
        }
        let start_skip = state
            .list(child)
            .link
            .as_ref()
            .map_or(0, |link| link.spec.start_skip);
        let child_base = state.content_base(parent, base, index, start_skip);
        let list = state.list(child);
        let removed: Vec<_> = (0..list.len()).map(|i| list.token(i).clone()).collect();
        let change = TokenListChange {
            path: list.path.clone(),
            index: 0,
            offset: child_base,
            removed,
            added: Vec::new(),
            removed_end: child_base + list.text_len(),
            added_end: child_base,
            bounds_change: false,
        };
        state.detach(parent, child);
        state.free_tree(child);
        let event = TokenHierarchyEvent::new(
            TokenHierarchyEventKind::EmbeddingRemoved,
            None,
            vec![change],
            0,
        );
        self.fire(&event);
        Ok(true)
    }

    // === Queries ===

    /// Sequence over the root token list; `None` when inactive or when
    /// lexing fails.
    pub fn token_sequence(&self) -> Option<TokenSequence<'_, I>> {
        self.try_token_sequence().ok()
    }

    pub fn try_token_sequence(&self) -> Result<TokenSequence<'_, I>, TokenHierarchyError> {
        self.check_read_lock("token_sequence");
        if !self.active {
            return Err(TokenHierarchyError::Inactive);
        }
        let root = self.ensure_root()?;
        let path = self.state.read().list(root).path.clone();
        Ok(TokenSequence::new(self, root, 0, path))
    }

    /// Sequences of every list for `path` whose content intersects
    /// `start..=end`, in text order. Joined sections are enumerated this way.
    pub fn token_sequence_list(
        &self,
        path: &LanguagePath,
        start: u32,
        end: u32,
    ) -> Vec<TokenSequence<'_, I>> {
        self.check_read_lock("token_sequence_list");
        let mut sequences = Vec::new();
        if !self.active || *path.top_language() != self.language {
            return sequences;
        }
        let Ok(root) = self.ensure_root() else {
            return sequences;
        };
        self.collect_sequences(root, 0, path, start, end, &mut sequences);
        sequences
    }

    /// One cursor over every list for `path`, with part tokens continued
    /// across joined sections merged into single logical tokens. `None`
    /// when no list for `path` exists.
    pub fn joined_token_sequence(
        &self,
        path: &LanguagePath,
    ) -> Option<JoinedTokenSequence<'_, I>> {
        let end = u32::try_from(self.input.text().len()).unwrap_or(u32::MAX);
        let sections = self.token_sequence_list(path, 0, end);
        (!sections.is_empty()).then(|| JoinedTokenSequence::new(sections))
    }

    /// Sequences from the root down to the innermost embedded list at
    /// `offset`, each positioned on the token containing it. With
    /// `backward_bias`, an offset between two tokens selects the earlier one.
    pub fn embedded_token_sequences(
        &self,
        offset: u32,
        backward_bias: bool,
    ) -> Vec<TokenSequence<'_, I>> {
        self.check_read_lock("embedded_token_sequences");
        let mut sequences = Vec::new();
        if !self.active {
            return sequences;
        }
        let Ok(root) = self.ensure_root() else {
            return sequences;
        };
        let mut current = Some((root, 0, LanguagePath::root(self.language.clone())));
        while let Some((id, base, path)) = current.take() {
            let Some(relative) = offset.checked_sub(base) else {
                break;
            };
            let index = {
                let state = self.state.read();
                let list = state.list(id);
                if relative > list.text_len() {
                    break;
                }
                let index = if backward_bias && relative > 0 {
                    list.first_ending_after(relative - 1)
                } else {
                    list.first_ending_after(relative)
                };
                if index >= list.len() || list.offset(index) > relative {
                    break;
                }
                index
            };
            let mut sequence = TokenSequence::new(self, id, base, path);
            sequence.move_index(index);
            sequence.move_next();
            sequences.push(sequence);
            current = self.embedded_list(id, base, index, None);
        }
        sequences
    }

    /// Every language path present in the hierarchy, creating embedded
    /// lists as needed, in depth-first order.
    pub fn language_paths(&self) -> Vec<LanguagePath> {
        self.check_read_lock("language_paths");
        let Ok(lists) = self.expand_all() else {
            return Vec::new();
        };
        let state = self.state.read();
        let mut seen = FxHashSet::default();
        lists
            .into_iter()
            .map(|(id, _)| state.list(id).path.clone())
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Every token of every list, creating embedded lists as needed. Lists
    /// are visited depth-first; a list's tokens come before those of the
    /// lists embedded in them.
    pub fn snapshot(&self) -> Result<Vec<SnapshotRow>, TokenHierarchyError> {
        self.check_read_lock("snapshot");
        if !self.active {
            return Ok(Vec::new());
        }
        let lists = self.expand_all()?;
        let state = self.state.read();
        let mut rows = Vec::new();
        for (id, base) in lists {
            let list = state.list(id);
            for (index, entry) in list.entries() {
                rows.push(SnapshotRow {
                    path: list.path.mime_path().to_owned(),
                    id: entry.token.id().name(),
                    offset: base + list.offset(index),
                    len: entry.token.len(),
                    part: entry.token.part(),
                    lookahead: entry.lookahead,
                    state: entry.state.clone(),
                });
            }
        }
        Ok(rows)
    }

    /// Check every invariant of the lists built so far against a fresh
    /// lexing run. Meant for tests and fuzzing.
    pub fn check_consistency(&self) -> Option<ConsistencyDiagnostic> {
        let cx = self.context();
        let state = self.state.read();
        consistency::check(
            &state,
            &cx,
            self.active,
            self.lock_violations.load(Ordering::Relaxed),
        )
    }

    /// Operations run without the input lock the operation needs.
    pub fn lock_violations(&self) -> u32 {
        self.lock_violations.load(Ordering::Relaxed)
    }

    /// Number of token lists currently built.
    pub fn list_count(&self) -> usize {
        self.state.read().live_lists()
    }

    // === Crate internals ===

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, HierarchyState> {
        self.state.read()
    }

    /// The list embedded in a token with its content base and path, created
    /// on first request.
    pub(crate) fn embedded_list(
        &self,
        parent: ListId,
        base: u32,
        index: usize,
        language: Option<&Language>,
    ) -> Option<(ListId, u32, LanguagePath)> {
        let cx = self.context();
        let mut state = self.state.write();
        let child = match state.ensure_embedding(&cx, parent, base, index, language) {
            Ok(child) => child?,
            Err(error) => {
                tracing::error!(%error, "embedded list could not be built");
                return None;
            }
        };
        let list = state.list(child);
        let start_skip = list.link.as_ref().map_or(0, |link| link.spec.start_skip);
        let path = list.path.clone();
        Some((child, state.content_base(parent, base, index, start_skip), path))
    }

    fn context(&self) -> LexContext<'_> {
        lex_context(&self.input, &self.resolver, &self.pool, &self.config)
    }

    fn ensure_root(&self) -> Result<ListId, TokenHierarchyError> {
        let root = self.state.read().root;
        if let Some(root) = root {
            return Ok(root);
        }
        let cx = self.context();
        let mut state = self.state.write();
        if let Some(root) = state.root {
            return Ok(root);
        }
        state.build_root(&cx, &self.language)
    }

    /// All lists depth-first, with their content bases, after creating the
    /// default embedding of every token.
    fn expand_all(&self) -> Result<Vec<(ListId, u32)>, TokenHierarchyError> {
        let root = self.ensure_root()?;
        let cx = self.context();
        let mut order = Vec::new();
        let mut pending = vec![(root, 0)];
        while let Some((id, base)) = pending.pop() {
            order.push((id, base));
            let mut state = self.state.write();
            let mut children = Vec::new();
            for index in 0..state.list(id).len() {
                state.ensure_embedding(&cx, id, base, index, None)?;
                for &child in &state.list(id).entry(index).embeddings {
                    let start_skip = state
                        .list(child)
                        .link
                        .as_ref()
                        .map_or(0, |link| link.spec.start_skip);
                    children.push((child, state.content_base(id, base, index, start_skip)));
                }
            }
            pending.extend(children.into_iter().rev());
        }
        Ok(order)
    }

    fn collect_sequences<'h>(
        &'h self,
        id: ListId,
        base: u32,
        path: &LanguagePath,
        start: u32,
        end: u32,
        out: &mut Vec<TokenSequence<'h, I>>,
    ) {
        let (list_path, first, count) = {
            let state = self.state.read();
            let list = state.list(id);
            if base > end || base + list.text_len() < start {
                return;
            }
            let first = start
                .checked_sub(base)
                .and_then(|relative| relative.checked_sub(1))
                .map_or(0, |relative| list.first_ending_after(relative));
            (list.path.clone(), first, list.len())
        };
        if list_path == *path {
            out.push(TokenSequence::new(self, id, base, list_path));
            return;
        }
        if !path.starts_with(&list_path) {
            return;
        }
        let Some(next) = path.language(list_path.size()) else {
            return;
        };
        for index in first..count {
            let offset = base + self.state.read().list(id).offset(index);
            if offset > end {
                break;
            }
            if let Some((child, child_base, _)) = self.embedded_list(id, base, index, Some(next)) {
                self.collect_sequences(child, child_base, path, start, end, out);
            }
        }
    }

    fn fire(&self, event: &TokenHierarchyEvent) {
        for listener in &self.listeners {
            listener.token_hierarchy_changed(event);
        }
    }

    fn check_read_lock(&self, operation: &'static str) {
        if self.config.verify_locks
            && !self.input.is_read_locked()
            && !self.input.is_write_locked()
        {
            self.lock_violations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(operation, "read lock not held");
        }
    }

    fn check_write_lock(&self, operation: &'static str) {
        if self.config.verify_locks && !self.input.is_write_locked() {
            self.lock_violations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(operation, "write lock not held");
        }
    }
}

impl TokenHierarchy<TextDocument> {
    /// Replace `remove_len` bytes at `offset` with `text` and update the
    /// tokens.
    pub fn edit(
        &mut self,
        offset: u32,
        remove_len: u32,
        text: &str,
    ) -> Result<Option<TokenHierarchyEvent>, TokenHierarchyError> {
        let Some(change) = self.input.replace(offset, remove_len, text) else {
            return Err(TokenHierarchyError::InvalidModification {
                offset,
                removed: remove_len,
                text_len: text_len(self.input.text()),
            });
        };
        self.text_modified(change)
    }
}

impl<I: MutableTextInput> std::fmt::Debug for TokenHierarchy<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHierarchy")
            .field("language", &self.language)
            .field("active", &self.active)
            .field("lists", &self.state.read().live_lists())
            .field("resolver", &self.resolver)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

/// Build the root list if needed and find the list for `path` and its
/// token containing `offset`, creating embedded lists on the way.
fn locate_token(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    root_language: &Language,
    path: &LanguagePath,
    offset: u32,
) -> Result<(ListId, u32, usize), TokenHierarchyError> {
    let missing = TokenHierarchyError::NoSuchToken { offset };
    if path.top_language() != root_language {
        return Err(missing);
    }
    let root = match state.root {
        Some(root) => root,
        None => state.build_root(cx, root_language)?,
    };
    let token_at = |state: &HierarchyState, id: ListId, base: u32| {
        let relative = offset.checked_sub(base)?;
        let list = state.list(id);
        let index = list.token_index_at(relative)?;
        (list.offset(index) <= relative).then_some(index)
    };

    let (mut id, mut base) = (root, 0);
    for language in &path.languages()[1..] {
        let index = token_at(state, id, base).ok_or(missing.clone())?;
        let Some(child) = state.ensure_embedding(cx, id, base, index, Some(language))? else {
            return Err(missing);
        };
        let start_skip = state
            .list(child)
            .link
            .as_ref()
            .map_or(0, |link| link.spec.start_skip);
        base = state.content_base(id, base, index, start_skip);
        id = child;
    }
    let index = token_at(state, id, base).ok_or(missing)?;
    Ok((id, base, index))
}

#[allow(
    clippy::too_many_arguments,
    reason = "forwards the public create_embedding arguments"
)]
fn create_custom(
    state: &mut HierarchyState,
    cx: &LexContext<'_>,
    root_language: &Language,
    path: &LanguagePath,
    offset: u32,
    language: Language,
    start_skip: u32,
    end_skip: u32,
) -> Result<Option<TokenListChange>, TokenHierarchyError> {
    let (parent, base, index) = locate_token(state, cx, root_language, path, offset)?;
    let token = state.list(parent).token(index);
    if token.is_flyweight() || state.existing_embedding(parent, index, Some(&language)).is_some() {
        return Ok(None);
    }
    let spec = EmbeddingSpec::new(language, start_skip, end_skip);
    if !spec.fits(token.len()) {
        return Err(TokenHierarchyError::EmbeddingDoesNotFit {
            token: token.id().name(),
            len: token.len(),
            start_skip,
            end_skip,
        });
    }
    let child = state.create_embedded(
        cx,
        parent,
        base,
        index,
        spec,
        LexerState::Default,
        ListFlags::CUSTOM,
    )?;
    let child_base = state.content_base(parent, base, index, start_skip);
    let list = state.list(child);
    Ok(Some(TokenListChange {
        path: list.path.clone(),
        index: 0,
        offset: child_base,
        removed: Vec::new(),
        added: (0..list.len()).map(|i| list.token(i).clone()).collect(),
        removed_end: child_base,
        added_end: child_base + list.text_len(),
        bounds_change: false,
    }))
}
