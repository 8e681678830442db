//! Token ids and dense id sets.

use std::fmt;

use smallvec::SmallVec;

/// Identity of a token kind within one language.
///
/// Ids are declared once per language as constants; the ordinal is the
/// dense index used for per-id tables (embedding caches, validators, skip
/// sets). A language rejects id tables whose ordinals are not `0..n`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId {
    name: &'static str,
    ordinal: u16,
    primary_category: Option<&'static str>,
}

impl TokenId {
    /// Id without a primary category.
    pub const fn new(name: &'static str, ordinal: u16) -> Self {
        TokenId {
            name,
            ordinal,
            primary_category: None,
        }
    }

    /// Id with a primary category such as `"operator"` or `"comment"`.
    pub const fn with_category(name: &'static str, ordinal: u16, category: &'static str) -> Self {
        TokenId {
            name,
            ordinal,
            primary_category: Some(category),
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn ordinal(&self) -> u16 {
        self.ordinal
    }

    #[inline]
    pub const fn primary_category(&self) -> Option<&'static str> {
        self.primary_category
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.ordinal)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Set of token ids, stored as a bit set over ordinals.
///
/// Two words inline cover 128 ordinals, which is more than any of the
/// bundled languages declares.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenIdSet {
    words: SmallVec<[u64; 2]>,
}

impl TokenIdSet {
    /// Create an empty set.
    pub fn new() -> Self {
        TokenIdSet::default()
    }

    /// Add an id. Returns `true` if it was not present.
    pub fn insert(&mut self, id: TokenId) -> bool {
        let (word, bit) = Self::locate(id.ordinal());
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        !was_set
    }

    /// Remove an id. Returns `true` if it was present.
    pub fn remove(&mut self, id: TokenId) -> bool {
        let (word, bit) = Self::locate(id.ordinal());
        match self.words.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn contains(&self, id: TokenId) -> bool {
        self.contains_ordinal(id.ordinal())
    }

    #[inline]
    pub fn contains_ordinal(&self, ordinal: u16) -> bool {
        let (word, bit) = Self::locate(ordinal);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Ordinals in ascending order.
    pub fn ordinals(&self) -> impl Iterator<Item = u16> + '_ {
        self.words.iter().enumerate().flat_map(|(index, word)| {
            (0..64u16).filter_map(move |bit| {
                if word & (1u64 << bit) == 0 {
                    return None;
                }
                u16::try_from(index * 64).ok().map(|base| base + bit)
            })
        })
    }

    #[inline]
    fn locate(ordinal: u16) -> (usize, u64) {
        (usize::from(ordinal / 64), 1u64 << (ordinal % 64))
    }
}

impl FromIterator<TokenId> for TokenIdSet {
    fn from_iter<T: IntoIterator<Item = TokenId>>(iter: T) -> Self {
        let mut set = TokenIdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl Extend<TokenId> for TokenIdSet {
    fn extend<T: IntoIterator<Item = TokenId>>(&mut self, iter: T) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl fmt::Debug for TokenIdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ordinals()).finish()
    }
}
