//! Token list arena and embedded list construction.
//!
//! Lists refer to each other by [`ListId`]: a token entry holds the ids of
//! the lists it hosts and an embedded list holds its parent's id. Nothing
//! stores absolute offsets; callers walk down from the root carrying the
//! absolute offset of each list's content start.

use relex_ir::LexerState;
use relex_lang::{EmbeddingQuery, EmbeddingSpec, Language, LanguagePath};

use crate::lexing::{lex_all, LexContext};
use crate::list::{EmbeddingLink, ListFlags, ListId, TokenList};
use crate::update::{repair_join_chain, UpdateLog};
use crate::TokenHierarchyError;

#[derive(Debug, Default)]
pub(crate) struct HierarchyState {
    lists: Vec<Option<TokenList>>,
    free: Vec<ListId>,
    pub root: Option<ListId>,
}

impl HierarchyState {
    pub fn new() -> Self {
        HierarchyState::default()
    }

    /// A live list.
    ///
    /// # Panics
    ///
    /// Panics if `id` was freed. Ids are only handed out for live lists and
    /// lists are only freed under exclusive access.
    pub fn list(&self, id: ListId) -> &TokenList {
        match self.lists.get(id.index()) {
            Some(Some(list)) => list,
            _ => panic!("token list {id:?} is not live"),
        }
    }

    /// See [`list`](Self::list).
    pub fn list_mut(&mut self, id: ListId) -> &mut TokenList {
        match self.lists.get_mut(id.index()) {
            Some(Some(list)) => list,
            _ => panic!("token list {id:?} is not live"),
        }
    }

    pub fn live_lists(&self) -> usize {
        self.lists.iter().filter(|slot| slot.is_some()).count()
    }

    /// Ids of all live lists.
    pub fn list_ids(&self) -> impl Iterator<Item = ListId> + '_ {
        self.lists.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|_| ListId::new(u32::try_from(index).unwrap_or(u32::MAX)))
        })
    }

    fn alloc(&mut self, list: TokenList) -> ListId {
        if let Some(id) = self.free.pop() {
            self.lists[id.index()] = Some(list);
            return id;
        }
        let id = ListId::new(u32::try_from(self.lists.len()).unwrap_or(u32::MAX));
        self.lists.push(Some(list));
        id
    }

    /// Free a list and every list embedded in it.
    pub fn free_tree(&mut self, id: ListId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(mut list) = self.lists.get_mut(id.index()).and_then(Option::take) {
                for entry in list.clear() {
                    pending.extend(entry.embeddings);
                }
                self.free.push(id);
            }
        }
    }

    /// Drop every list.
    pub fn clear(&mut self) {
        self.lists.clear();
        self.free.clear();
        self.root = None;
    }

    /// Lex the whole input into a fresh root list.
    pub fn build_root(
        &mut self,
        cx: &LexContext<'_>,
        language: &Language,
    ) -> Result<ListId, TokenHierarchyError> {
        self.clear();
        let path = LanguagePath::root(language.clone());
        let text_len = u32::try_from(cx.text.len()).unwrap_or(u32::MAX);
        let batch = lex_all(cx, &path, cx.text, 0, &LexerState::Default)?;
        tracing::debug!(path = %path, tokens = batch.entries.len(), "root list built");
        let mut list = TokenList::new(path, LexerState::Default, None, ListFlags::empty());
        list.fill(batch.entries, batch.trailing_skip, text_len);
        let id = self.alloc(list);
        self.root = Some(id);
        Ok(id)
    }

    // === Embeddings ===

    /// Absolute offset of the content of the list embedded by `spec` in
    /// token `index` of `parent`, whose content starts at `base`.
    pub fn content_base(&self, parent: ListId, base: u32, index: usize, start_skip: u32) -> u32 {
        base + self.list(parent).offset(index) + start_skip
    }

    /// Resolve the default embedding of a token.
    pub fn resolve_default(
        &self,
        cx: &LexContext<'_>,
        parent: ListId,
        base: u32,
        index: usize,
    ) -> Option<EmbeddingSpec> {
        let list = self.list(parent);
        let token = list.token(index);
        if token.is_flyweight() {
            return None;
        }
        let start = base + list.offset(index);
        let text = cx
            .text
            .get(start as usize..(start + token.len()) as usize)?;
        cx.resolver.resolve(&EmbeddingQuery {
            token,
            text,
            path: &list.path,
            attributes: cx.attributes,
        })
    }

    /// Lex and attach a list embedded in token `index` of `parent`.
    pub fn create_embedded(
        &mut self,
        cx: &LexContext<'_>,
        parent: ListId,
        base: u32,
        index: usize,
        spec: EmbeddingSpec,
        start_state: LexerState,
        flags: ListFlags,
    ) -> Result<ListId, TokenHierarchyError> {
        let parent_list = self.list(parent);
        let host_len = parent_list.token(index).len();
        let content_len = host_len
            .saturating_sub(spec.start_skip)
            .saturating_sub(spec.end_skip);
        let content_base = self.content_base(parent, base, index, spec.start_skip);
        let path = parent_list.path.embedded(spec.language.clone());
        let content = cx.content(&path, content_base, content_len)?;
        let batch = lex_all(cx, &path, content, content_base, &start_state)?;
        tracing::debug!(
            path = %path,
            offset = content_base,
            tokens = batch.entries.len(),
            joined = flags.contains(ListFlags::JOINED),
            "embedded list created"
        );

        let mut list = TokenList::new(path, start_state, Some(EmbeddingLink { parent, spec }), flags);
        list.fill(batch.entries, batch.trailing_skip, content_len);
        let id = self.alloc(list);
        self.list_mut(parent).entry_mut(index).embeddings.push(id);
        Ok(id)
    }

    /// Existing list embedded in a token: the one for `language`, or the
    /// default embedding when no language is given.
    pub fn existing_embedding(
        &self,
        parent: ListId,
        index: usize,
        language: Option<&Language>,
    ) -> Option<ListId> {
        let embeddings = &self.list(parent).entry(index).embeddings;
        match language {
            Some(language) => embeddings
                .iter()
                .copied()
                .find(|&child| self.list(child).path.inner_language() == language),
            None => embeddings
                .iter()
                .copied()
                .find(|&child| !self.list(child).flags.contains(ListFlags::CUSTOM))
                .or_else(|| embeddings.first().copied()),
        }
    }

    /// Joined section of `language` hosted by a token.
    pub fn joined_section(&self, parent: ListId, index: usize, language: &Language) -> Option<ListId> {
        self.list(parent)
            .entry(index)
            .embeddings
            .iter()
            .copied()
            .find(|&child| {
                let list = self.list(child);
                list.flags.contains(ListFlags::JOINED) && list.path.inner_language() == language
            })
    }

    /// The list embedded in a token, created on first request.
    ///
    /// Creating one section of a joined chain creates the whole chain.
    pub fn ensure_embedding(
        &mut self,
        cx: &LexContext<'_>,
        parent: ListId,
        base: u32,
        index: usize,
        language: Option<&Language>,
    ) -> Result<Option<ListId>, TokenHierarchyError> {
        let existing = self.existing_embedding(parent, index, language);
        // A custom embedding only answers an unqualified request once the
        // default embedding is known to be absent.
        if let Some(found) = existing {
            if language.is_some() || !self.list(found).flags.contains(ListFlags::CUSTOM) {
                return Ok(Some(found));
            }
        }
        let Some(spec) = self.resolve_default(cx, parent, base, index) else {
            return Ok(existing);
        };
        if language.is_some_and(|language| *language != spec.language) {
            return Ok(None);
        }
        if let Some(found) = existing {
            if *self.list(found).path.inner_language() == spec.language {
                return Ok(Some(found));
            }
        }
        if spec.join_sections {
            let joined = spec.language.clone();
            let list = self.list_mut(parent);
            if list.joined.contains(&joined) {
                // The chain exists but this host was not part of it when it
                // was built. Attach a section without touching the others.
                let start_state = (0..index)
                    .rev()
                    .find_map(|before| self.joined_section(parent, before, &joined))
                    .map_or(LexerState::Default, |section| {
                        self.list(section).end_state().clone()
                    });
                return self
                    .create_embedded(cx, parent, base, index, spec, start_state, ListFlags::JOINED)
                    .map(Some);
            }
            list.joined.push(joined.clone());
            let len = list.len();
            // Chain creation records no change events.
            let mut log = UpdateLog::default();
            repair_join_chain(self, cx, parent, base, &joined, 0, len, &mut log)?;
            return Ok(self.joined_section(parent, index, &joined));
        }
        self.create_embedded(
            cx,
            parent,
            base,
            index,
            spec,
            LexerState::Default,
            ListFlags::empty(),
        )
        .map(Some)
    }

    /// Tear down every list created by embedding resolution. Custom
    /// embeddings stay unless an ancestor goes.
    pub fn drop_default_embeddings(&mut self) -> usize {
        let resolved: Vec<ListId> = self
            .list_ids()
            .filter(|&id| {
                let list = self.list(id);
                list.link.is_some() && !list.flags.contains(ListFlags::CUSTOM)
            })
            .collect();
        let mut dropped = 0;
        for id in resolved {
            if !self.is_live(id) {
                continue;
            }
            if let Some(parent) = self.list(id).link.as_ref().map(|link| link.parent) {
                if self.is_live(parent) {
                    self.detach(parent, id);
                }
            }
            self.free_tree(id);
            dropped += 1;
        }
        for id in self.list_ids().collect::<Vec<_>>() {
            self.list_mut(id).joined.clear();
        }
        dropped
    }

    /// Remove `child` from its host's embedding list.
    pub fn detach(&mut self, parent: ListId, child: ListId) {
        let list = self.list_mut(parent);
        for index in 0..list.len() {
            let embeddings = &mut list.entry_mut(index).embeddings;
            if let Some(position) = embeddings.iter().position(|&id| id == child) {
                embeddings.remove(position);
                return;
            }
        }
    }

    fn is_live(&self, id: ListId) -> bool {
        matches!(self.lists.get(id.index()), Some(Some(_)))
    }
}
