//! Key resolution: tree descent, the last-search cache and partial-match
//! boundary adjustment.

use std::cell::Cell;
use std::cmp::Ordering;
use std::time::Instant;

use super::MvrbTree;
use super::page::NodeId;

/// A slot inside a live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub slot: usize,
}

impl Position {
    #[must_use]
    pub const fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

/// Where a key was found, or where it would be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// The page the search ended on; `None` only for an empty tree.
    pub node: Option<NodeId>,
    /// Matching slot on a hit, insertion point on a miss.
    pub slot: usize,
    pub found: bool,
}

impl SearchResult {
    const EMPTY: Self = Self {
        node: None,
        slot: 0,
        found: false,
    };

    const fn hit(node: NodeId, slot: usize) -> Self {
        Self {
            node: Some(node),
            slot,
            found: true,
        }
    }

    const fn miss(node: NodeId, slot: usize) -> Self {
        Self {
            node: Some(node),
            slot,
            found: false,
        }
    }

    /// The matched position, if the search was a hit.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match (self.found, self.node) {
            (true, Some(node)) => Some(Position::new(node, self.slot)),
            _ => None,
        }
    }
}

/// How a lookup resolves a search key that compares equal to a run of stored keys.
///
/// Composite keys compare over their common prefix, so a short search key can be
/// equal to several stored keys at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialSearchMode {
    /// Any equal key.
    #[default]
    None,
    /// The smallest key equal to the search key.
    LowestBoundary,
    /// The largest key equal to the search key.
    HighestBoundary,
}

#[derive(Debug, Clone, Copy)]
struct CachedSearch {
    position: Position,
    mod_count: u64,
}

/// The position of the most recent successful lookup.
///
/// An entry is only trusted while the tree's modification counter is
/// unchanged and the key stored at the position still equals the search key.
#[derive(Debug, Default)]
pub struct SearchCache {
    last: Cell<Option<CachedSearch>>,
}

impl SearchCache {
    pub(crate) fn get(&self, mod_count: u64) -> Option<Position> {
        self.last
            .get()
            .filter(|cached| cached.mod_count == mod_count)
            .map(|cached| cached.position)
    }

    pub(crate) fn set(&self, position: Position, mod_count: u64) {
        self.last.set(Some(CachedSearch {
            position,
            mod_count,
        }));
    }

    pub(crate) fn clear(&self) {
        self.last.set(None);
    }
}

impl<K, V> MvrbTree<K, V> {
    /// Resolve `key` to a position, consulting the last-search cache first.
    pub(crate) fn locate(&self, key: &K) -> SearchResult {
        let started = Instant::now();

        if let Some(position) = self.cached_position(key) {
            self.stats.record_cache_hit();
            self.stats.record_lookup(0, started.elapsed());
            tracing::trace!(node = position.node.index(), slot = position.slot, "search cache hit");
            return SearchResult::hit(position.node, position.slot);
        }

        let (result, visited) = self.descend(key);
        self.stats.record_lookup(visited, started.elapsed());
        if let Some(position) = result.position() {
            self.cache.set(position, self.mod_count);
        }
        result
    }

    /// Resolve `key`, then move to the requested end of the run of keys that
    /// compare equal to it.
    pub(crate) fn locate_partial(&self, key: &K, mode: PartialSearchMode) -> SearchResult {
        if mode == PartialSearchMode::None {
            return self.locate(key);
        }

        let started = Instant::now();
        let (result, visited) = self.descend(key);
        self.stats.record_lookup(visited, started.elapsed());

        let Some(mut position) = result.position() else {
            return result;
        };
        loop {
            let neighbour = match mode {
                PartialSearchMode::LowestBoundary => self.prev_position(position),
                PartialSearchMode::HighestBoundary => self.next_position(position),
                PartialSearchMode::None => None,
            };
            match neighbour {
                Some(next) if self.key_equals(next, key) => position = next,
                _ => break,
            }
        }

        self.cache.set(position, self.mod_count);
        SearchResult::hit(position.node, position.slot)
    }

    fn cached_position(&self, key: &K) -> Option<Position> {
        let position = self.cache.get(self.mod_count)?;
        let page = self.nodes.get(position.node.index())?;
        if !page.is_alive() {
            return None;
        }
        self.key_equals(position, key).then_some(position)
    }

    fn key_equals(&self, position: Position, key: &K) -> bool {
        self.key_at(position)
            .is_some_and(|stored| self.order.compare(key, stored) == Ordering::Equal)
    }

    /// Walk down from the root, returning the result and the number of pages
    /// visited.
    ///
    /// A key below a page's first key goes left, above its last key goes
    /// right; a key bracketed by the page is searched within it. Falling off
    /// the tree yields the insertion point at slot `0` or `len()` of the last
    /// page visited.
    fn descend(&self, key: &K) -> (SearchResult, u64) {
        let Some(mut node) = self.root else {
            return (SearchResult::EMPTY, 0);
        };
        let mut visited = 0;

        loop {
            visited += 1;
            let page = self.page(node);
            let (Some(first), Some(last)) = (page.first_key(), page.last_key()) else {
                return (SearchResult::miss(node, 0), visited);
            };

            match self.order.compare(key, first) {
                Ordering::Equal => return (SearchResult::hit(node, 0), visited),
                Ordering::Less => match page.left {
                    Some(left) => {
                        node = left;
                        continue;
                    }
                    None => return (SearchResult::miss(node, 0), visited),
                },
                Ordering::Greater => {}
            }

            match self.order.compare(key, last) {
                Ordering::Equal => return (SearchResult::hit(node, page.len() - 1), visited),
                Ordering::Greater => match page.right {
                    Some(right) => {
                        node = right;
                        continue;
                    }
                    None => return (SearchResult::miss(node, page.len()), visited),
                },
                Ordering::Less => {}
            }

            let found = page.search(key, &self.order);
            let result = if found.found {
                SearchResult::hit(node, found.slot)
            } else {
                SearchResult::miss(node, found.slot)
            };
            return (result, visited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::key::CompositeKey;

    fn small_tree(keys: impl IntoIterator<Item = i32>) -> MvrbTree<i32, i32> {
        let mut tree = MvrbTree::with_config(TreeConfig::new(4)).expect("valid config");
        for k in keys {
            tree.insert(k, k * 10).expect("insert should succeed");
        }
        tree
    }

    #[test]
    fn test_locate_hit_and_miss() {
        let tree = small_tree((0..40).map(|i| i * 2));

        let hit = tree.locate(&24);
        assert!(hit.found);
        assert_eq!(tree.key_at(hit.position().expect("hit")), Some(&24));

        let miss = tree.locate(&25);
        assert!(!miss.found);
        assert!(miss.position().is_none());
        assert!(miss.node.is_some());
    }

    #[test]
    fn test_locate_empty_tree() {
        let tree: MvrbTree<i32, i32> = MvrbTree::new();
        assert_eq!(tree.locate(&1), SearchResult::EMPTY);
    }

    #[test]
    fn test_cache_hit_after_repeat_lookup() {
        let tree = small_tree(0..50);
        tree.reset_stats();

        assert_eq!(tree.get(&17), Some(&170));
        assert_eq!(tree.get(&17), Some(&170));

        let stats = tree.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_cache_invalidated_by_mutation() {
        let mut tree = small_tree(0..50);
        assert_eq!(tree.get(&17), Some(&170));
        tree.remove(&3);
        tree.reset_stats();

        assert_eq!(tree.get(&17), Some(&170));
        assert_eq!(tree.stats().cache_hits, 0);
    }

    #[test]
    fn test_cache_rejects_different_key() {
        let tree = small_tree(0..50);
        assert_eq!(tree.get(&17), Some(&170));
        tree.reset_stats();

        assert_eq!(tree.get(&18), Some(&180));
        assert_eq!(tree.stats().cache_hits, 0);
    }

    #[test]
    fn test_partial_boundaries() {
        let mut tree = MvrbTree::with_config(TreeConfig::new(2)).expect("valid config");
        for (i, suffix) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let key = CompositeKey::from(1).with_key(*suffix);
            tree.insert(key, i).expect("insert should succeed");
        }
        tree.insert(CompositeKey::from(0).with_key("z"), 99)
            .expect("insert should succeed");
        tree.insert(CompositeKey::from(2).with_key("a"), 98)
            .expect("insert should succeed");

        let prefix = CompositeKey::from(1);
        let lowest = tree.locate_partial(&prefix, PartialSearchMode::LowestBoundary);
        let highest = tree.locate_partial(&prefix, PartialSearchMode::HighestBoundary);

        assert_eq!(
            tree.key_at(lowest.position().expect("lowest")),
            Some(&CompositeKey::from(1).with_key("a"))
        );
        assert_eq!(
            tree.key_at(highest.position().expect("highest")),
            Some(&CompositeKey::from(1).with_key("e"))
        );
    }
}
