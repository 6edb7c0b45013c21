//! Registry of every known token kind.

use std::collections::HashMap;

use aether_types::{KindId, TokenKind};

use crate::seed;

/// Kind metadata keyed by id, plus the ordered library of discovered kinds.
///
/// Entries are never overwritten or removed. The library is a subset of the
/// catalog in discovery order; only library kinds may be placed directly.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    kinds: HashMap<KindId, TokenKind>,
    library: Vec<KindId>,
}

impl TokenCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the primitive and pre-described kinds, with the
    /// primitives already in the library.
    #[must_use]
    pub fn seeded() -> Self {
        let mut catalog = Self::new();
        for seed in seed::PRIMITIVES {
            let kind = seed.to_kind();
            let id = kind.id.clone();
            catalog.insert_if_absent(kind);
            catalog.add_to_library(&id);
        }
        for seed in seed::DERIVED {
            catalog.insert_if_absent(seed.to_kind());
        }
        catalog
    }

    #[must_use]
    pub fn get(&self, id: &KindId) -> Option<&TokenKind> {
        self.kinds.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &KindId) -> bool {
        self.kinds.contains_key(id)
    }

    /// Returns `true` if the kind was added; an existing entry always wins.
    pub fn insert_if_absent(&mut self, kind: TokenKind) -> bool {
        if self.kinds.contains_key(&kind.id) {
            return false;
        }
        self.kinds.insert(kind.id.clone(), kind);
        true
    }

    /// Returns `true` if the kind newly joined the library.
    ///
    /// Uncataloged ids are refused.
    pub fn add_to_library(&mut self, id: &KindId) -> bool {
        if !self.contains(id) || self.library.contains(id) {
            return false;
        }
        self.library.push(id.clone());
        true
    }

    #[must_use]
    pub fn in_library(&self, id: &KindId) -> bool {
        self.library.contains(id)
    }

    /// Library kinds in discovery order.
    pub fn library(&self) -> impl Iterator<Item = &TokenKind> {
        self.library.iter().filter_map(|id| self.kinds.get(id))
    }

    #[must_use]
    pub fn library_len(&self) -> usize {
        self.library.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// All cataloged kinds, sorted by id.
    #[must_use]
    pub fn sorted(&self) -> Vec<&TokenKind> {
        let mut kinds: Vec<_> = self.kinds.values().collect();
        kinds.sort_by(|a, b| a.id.cmp(&b.id));
        kinds
    }
}
