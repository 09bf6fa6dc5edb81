//! The paged multi-value red-black tree.
//!
//! Each node of the red-black tree is a [`Page`] holding up to `page_size`
//! sorted key/value pairs. Every key in a page's left subtree is smaller
//! than its first key and every key in its right subtree is larger than its
//! last key, so the pages read in-order give the full sorted sequence.
//!
//! Nodes live in an arena (`Vec<Page>` plus a free list) and reference each
//! other by [`NodeId`].
//!
//! # Mutation
//!
//! - Insertion goes into the page the search ended on. A full page first
//!   tries its in-order neighbour on the insertion side, then splits: the
//!   tail moves to a new red sibling linked as the page's successor.
//! - Removal shifts the page left. A page that empties is unlinked; when it
//!   has two children its successor's slots move into it and the successor
//!   is unlinked instead.
//!
//! Every insert of a new key, removal and clear bumps the modification
//! counter, which invalidates the last-search cache and fails open cursors.

#![allow(clippy::cast_possible_truncation)]

mod balance;
mod build;
mod invariants;
mod navigate;
mod order;
mod page;
mod search;

use std::cmp::Ordering;
use std::ops::Bound;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::iter::{Cursor, Direction, Iter, Keys, Values};
use crate::stats::{StatsSnapshot, TreeStats};
use crate::view::{KeySet, SubMap, SubMapMut};

pub use invariants::StructureViolation;
pub use order::{Comparator, KeyOrder};
pub use page::{BINARY_SEARCH_THRESHOLD, Color, NodeId, Page, PageSearch};
pub use search::{PartialSearchMode, Position, SearchCache, SearchResult};

/// An ordered map stored as a red-black tree of multi-slot pages.
pub struct MvrbTree<K, V> {
    nodes: Vec<Page<K, V>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
    mod_count: u64,
    config: TreeConfig,
    order: KeyOrder<K>,
    cache: SearchCache,
    stats: TreeStats,
}

/// What [`MvrbTree::delete_at`] removed.
#[derive(Debug)]
pub(crate) struct Removal<K, V> {
    pub key: K,
    pub value: V,
    /// `(from, into)` when a successor page's slots moved into another node.
    pub relocated: Option<(NodeId, NodeId)>,
}

/// Where a split sibling attaches.
#[derive(Debug, Clone, Copy)]
enum Link {
    Left(NodeId),
    Right(NodeId),
}

impl<K, V> MvrbTree<K, V> {
    pub(crate) fn empty(config: TreeConfig, order: KeyOrder<K>) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            mod_count: 0,
            config,
            order,
            cache: SearchCache::default(),
            stats: TreeStats::default(),
        }
    }

    /// Number of key/value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Page layout this tree was created with.
    #[must_use]
    pub const fn config(&self) -> TreeConfig {
        self.config
    }

    /// The key order in use.
    #[must_use]
    pub const fn order(&self) -> &KeyOrder<K> {
        &self.order
    }

    /// Structural modification counter.
    #[must_use]
    pub const fn mod_count(&self) -> u64 {
        self.mod_count
    }

    /// Number of live pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
        self.mod_count += 1;
        self.cache.clear();
    }

    /// Iterate over entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self, self.first_position(), self.last_position(), false)
    }

    /// Iterate over entries in descending key order.
    #[must_use]
    pub fn iter_rev(&self) -> Iter<'_, K, V> {
        Iter::new(self, self.last_position(), self.first_position(), true)
    }

    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// A detached ascending cursor that can remove or update entries.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.first_position(), self.mod_count, Direction::Ascending)
    }

    /// A detached descending cursor.
    #[must_use]
    pub fn descending_cursor(&self) -> Cursor {
        Cursor::new(self.last_position(), self.mod_count, Direction::Descending)
    }

    /// Smallest entry, if any.
    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.first_position().and_then(|p| self.entry_at(p))
    }

    /// Largest entry, if any.
    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.last_position().and_then(|p| self.entry_at(p))
    }

    pub fn first_key(&self) -> Result<&K, TreeError> {
        self.first_entry().map(|(k, _)| k).ok_or(TreeError::NoSuchElement)
    }

    pub fn last_key(&self) -> Result<&K, TreeError> {
        self.last_entry().map(|(k, _)| k).ok_or(TreeError::NoSuchElement)
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let position = self.first_position()?;
        let removal = self.delete_at(position);
        Some((removal.key, removal.value))
    }

    /// Remove and return the largest entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let position = self.last_position()?;
        let removal = self.delete_at(position);
        Some((removal.key, removal.value))
    }

    /// Remove the pair at `position`, unlinking its page if it empties.
    pub(crate) fn delete_at(&mut self, position: Position) -> Removal<K, V> {
        let (key, value) = self.page_mut(position.node).remove(position.slot);
        let relocated = if self.page(position.node).is_empty() {
            self.delete_node(position.node)
        } else {
            None
        };

        self.len -= 1;
        self.mod_count += 1;
        self.cache.clear();
        Removal {
            key,
            value,
            relocated,
        }
    }

    pub(crate) fn page(&self, id: NodeId) -> &Page<K, V> {
        &self.nodes[id.index()]
    }

    pub(crate) fn page_mut(&mut self, id: NodeId) -> &mut Page<K, V> {
        &mut self.nodes[id.index()]
    }

    /// Mutable access to two distinct pages at once.
    fn pages_mut(&mut self, a: NodeId, b: NodeId) -> (&mut Page<K, V>, &mut Page<K, V>) {
        debug_assert_ne!(a, b);
        if a.index() < b.index() {
            let (low, high) = self.nodes.split_at_mut(b.index());
            (&mut low[a.index()], &mut high[0])
        } else {
            let (low, high) = self.nodes.split_at_mut(a.index());
            (&mut high[0], &mut low[b.index()])
        }
    }

    pub(crate) fn allocate(&mut self, page: Page<K, V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = page;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(page);
        id
    }

    fn release(&mut self, id: NodeId) {
        self.page_mut(id).release();
        self.free.push(id);
    }
}

impl<K: Ord, V> MvrbTree<K, V> {
    /// An empty tree with the default page layout and natural key order.
    #[must_use]
    pub fn new() -> Self {
        Self::empty(TreeConfig::default(), KeyOrder::natural())
    }

    /// An empty tree with the given page layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the config fails validation.
    pub fn with_config(config: TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;
        Ok(Self::empty(config, KeyOrder::natural()))
    }
}

impl<K, V> MvrbTree<K, V> {
    /// An empty tree ordered by `compare`. `K` need not implement `Ord`.
    pub fn with_comparator<F>(config: TreeConfig, compare: F) -> Result<Self, TreeError>
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self::empty(config, KeyOrder::custom(compare)))
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let position = self.locate(key).position()?;
        self.page(position.node).value(position.slot)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let position = self.locate(key).position()?;
        self.value_at_mut(position)
    }

    /// The stored entry whose key equals `key`.
    #[must_use]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let position = self.locate(key).position()?;
        self.entry_at(position)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).found
    }

    /// Insert a pair, returning the previous value if the key was present.
    ///
    /// Replacing the value of an existing key does not count as a
    /// structural modification.
    ///
    /// # Errors
    ///
    /// Returns `CorruptTree` if a split cannot find a unique place for the
    /// new page. The tree is left unchanged in that case.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        if self.root.is_none() {
            let mut page = Page::new(self.config.page_size);
            page.push(key, value);
            let root = self.allocate(page);
            self.root = Some(root);
            self.len = 1;
            self.mod_count += 1;
            self.cache.clear();
            return Ok(None);
        }

        let result = self.locate(&key);
        let Some(node) = result.node else {
            return Err(TreeError::CorruptTree(
                "search on a non-empty tree ended nowhere".to_string(),
            ));
        };
        if result.found {
            return Ok(Some(self.page_mut(node).replace_value(result.slot, value)));
        }

        self.insert_at(node, result.slot, key, value)?;
        self.len += 1;
        self.mod_count += 1;
        self.cache.clear();
        Ok(None)
    }

    fn insert_at(&mut self, node: NodeId, slot: usize, key: K, value: V) -> Result<(), TreeError> {
        let (full, len) = (self.page(node).is_full(), self.page(node).len());
        if !full {
            self.page_mut(node).insert(slot, key, value);
            return Ok(());
        }

        // A key falling off either end of a full page may fit in the
        // neighbouring page on that side.
        if slot == 0 {
            if let Some(prev) = self.predecessor(node).filter(|&p| !self.page(p).is_full()) {
                let end = self.page(prev).len();
                self.page_mut(prev).insert(end, key, value);
                return Ok(());
            }
        } else if slot == len {
            if let Some(next) = self.successor(node).filter(|&n| !self.page(n).is_full()) {
                self.page_mut(next).insert(0, key, value);
                return Ok(());
            }
        }

        self.split_and_insert(node, slot, key, value)
    }

    fn split_and_insert(
        &mut self,
        node: NodeId,
        slot: usize,
        key: K,
        value: V,
    ) -> Result<(), TreeError> {
        let len = self.page(node).len();
        let split_at = self
            .page(node)
            .split_items(self.config.load_factor)
            .clamp(1, len.saturating_sub(1).max(1));
        let link = self.sibling_link(node, split_at)?;

        let mut sibling = self.page_mut(node).split_off(split_at);
        if slot <= split_at {
            self.page_mut(node).insert(slot, key, value);
        } else {
            sibling.insert(slot - split_at, key, value);
        }
        sibling.color = Color::Red;

        let sibling = self.allocate(sibling);
        match link {
            Link::Left(parent) => self.page_mut(parent).left = Some(sibling),
            Link::Right(parent) => self.page_mut(parent).right = Some(sibling),
        }
        let (Link::Left(parent) | Link::Right(parent)) = link;
        self.page_mut(sibling).parent = Some(parent);
        self.fix_after_insertion(sibling);

        self.stats.record_split();
        tracing::debug!(
            node = node.index(),
            sibling = sibling.index(),
            split_at,
            "split full page"
        );
        Ok(())
    }

    /// Find where a sibling holding `node`'s slots from `split_at` attaches
    /// so that it becomes `node`'s in-order successor.
    ///
    /// Runs before any slot moves, so a failure leaves the tree untouched.
    fn sibling_link(&self, node: NodeId, split_at: usize) -> Result<Link, TreeError> {
        let Some(sibling_first) = self.page(node).key(split_at) else {
            return Err(TreeError::CorruptTree(format!(
                "split point {split_at} beyond page {}",
                node.index()
            )));
        };
        let Some(mut current) = self.page(node).right else {
            return Ok(Link::Right(node));
        };

        loop {
            let page = self.page(current);
            let Some(first) = page.first_key() else {
                return Err(TreeError::CorruptTree(format!(
                    "empty page {} in right subtree",
                    current.index()
                )));
            };
            match self.order.compare(sibling_first, first) {
                Ordering::Equal => {
                    return Err(TreeError::CorruptTree(format!(
                        "page {} already starts with the split key",
                        current.index()
                    )));
                }
                Ordering::Less => match page.left {
                    Some(left) => current = left,
                    None => return Ok(Link::Left(current)),
                },
                Ordering::Greater => match page.right {
                    Some(right) => current = right,
                    None => return Ok(Link::Right(current)),
                },
            }
        }
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let position = self.locate(key).position()?;
        let removal = self.delete_at(position);
        Some((removal.key, removal.value))
    }

    /// Entry with the greatest key `<= key`.
    #[must_use]
    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.floor_position(key, true).and_then(|p| self.entry_at(p))
    }

    /// Entry with the least key `>= key`.
    #[must_use]
    pub fn ceiling_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.ceiling_position(key, true).and_then(|p| self.entry_at(p))
    }

    /// Entry with the least key `> key`.
    #[must_use]
    pub fn higher_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.ceiling_position(key, false).and_then(|p| self.entry_at(p))
    }

    /// Entry with the greatest key `< key`.
    #[must_use]
    pub fn lower_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.floor_position(key, false).and_then(|p| self.entry_at(p))
    }

    #[must_use]
    pub fn floor_key(&self, key: &K) -> Option<&K> {
        self.floor_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn ceiling_key(&self, key: &K) -> Option<&K> {
        self.ceiling_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn higher_key(&self, key: &K) -> Option<&K> {
        self.higher_entry(key).map(|(k, _)| k)
    }

    #[must_use]
    pub fn lower_key(&self, key: &K) -> Option<&K> {
        self.lower_entry(key).map(|(k, _)| k)
    }

    /// Look up `key`, resolving a run of equal keys according to `mode`.
    ///
    /// With composite keys a shorter search key compares equal to every stored key
    /// sharing its prefix. `LowestBoundary` returns the first of those,
    /// `HighestBoundary` the last and `None` any one of them. Walking to a
    /// boundary is linear in the number of matching entries.
    #[must_use]
    pub fn get_entry_partial(&self, key: &K, mode: PartialSearchMode) -> Option<(&K, &V)> {
        let position = self.locate_partial(key, mode).position()?;
        self.entry_at(position)
    }

    /// Like [`ceiling_entry`](Self::ceiling_entry), resolving an exact match
    /// according to `mode`.
    #[must_use]
    pub fn ceiling_entry_partial(&self, key: &K, mode: PartialSearchMode) -> Option<(&K, &V)> {
        let result = self.locate_partial(key, mode);
        if let Some(position) = result.position() {
            return self.entry_at(position);
        }
        self.ceiling_entry(key)
    }

    /// Like [`floor_entry`](Self::floor_entry), resolving an exact match
    /// according to `mode`.
    #[must_use]
    pub fn floor_entry_partial(&self, key: &K, mode: PartialSearchMode) -> Option<(&K, &V)> {
        let result = self.locate_partial(key, mode);
        if let Some(position) = result.position() {
            return self.entry_at(position);
        }
        self.floor_entry(key)
    }

    /// A view of the entries between `lo` and `hi`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `lo` is greater than `hi`.
    pub fn sub_map(&self, lo: Bound<K>, hi: Bound<K>) -> Result<SubMap<'_, K, V>, TreeError> {
        SubMap::new(self, lo, hi, false)
    }

    /// A view of the entries below `hi`.
    #[must_use]
    pub fn head_map(&self, hi: Bound<K>) -> SubMap<'_, K, V> {
        SubMap::unchecked(self, Bound::Unbounded, hi, false)
    }

    /// A view of the entries above `lo`.
    #[must_use]
    pub fn tail_map(&self, lo: Bound<K>) -> SubMap<'_, K, V> {
        SubMap::unchecked(self, lo, Bound::Unbounded, false)
    }

    /// A mutable view of the entries between `lo` and `hi`.
    pub fn sub_map_mut(
        &mut self,
        lo: Bound<K>,
        hi: Bound<K>,
    ) -> Result<SubMapMut<'_, K, V>, TreeError> {
        SubMapMut::new(self, lo, hi)
    }

    #[must_use]
    pub fn head_map_mut(&mut self, hi: Bound<K>) -> SubMapMut<'_, K, V> {
        SubMapMut::unchecked(self, Bound::Unbounded, hi)
    }

    #[must_use]
    pub fn tail_map_mut(&mut self, lo: Bound<K>) -> SubMapMut<'_, K, V> {
        SubMapMut::unchecked(self, lo, Bound::Unbounded)
    }

    /// The whole map in descending key order.
    #[must_use]
    pub fn descending_map(&self) -> SubMap<'_, K, V> {
        SubMap::unchecked(self, Bound::Unbounded, Bound::Unbounded, true)
    }

    /// The keys as a navigable set.
    #[must_use]
    pub fn key_set(&self) -> KeySet<'_, K, V> {
        KeySet::new(SubMap::unchecked(self, Bound::Unbounded, Bound::Unbounded, false))
    }

    /// The keys as a navigable set in descending order.
    #[must_use]
    pub fn descending_key_set(&self) -> KeySet<'_, K, V> {
        KeySet::new(self.descending_map())
    }
}

impl<K: Ord, V> Default for MvrbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for MvrbTree<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a MvrbTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Extend<(K, V)> for MvrbTree<K, V> {
    /// Insert every pair, stopping at the first `CorruptTree` error.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        for (key, value) in entries {
            if let Err(e) = self.insert(key, value) {
                tracing::error!(error = %e, "extend stopped on corrupt tree");
                return;
            }
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for MvrbTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let mut tree = Self::new();
        tree.extend(entries);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_capacity(capacity: usize) -> MvrbTree<i32, String> {
        MvrbTree::with_config(TreeConfig::new(capacity)).expect("valid config")
    }

    #[test]
    fn test_insert_get_replace() {
        let mut tree = tree_with_capacity(4);
        assert_eq!(tree.insert(1, "one".to_string()), Ok(None));
        assert_eq!(tree.insert(2, "two".to_string()), Ok(None));
        let count = tree.mod_count();

        assert_eq!(tree.insert(1, "uno".to_string()), Ok(Some("one".to_string())));
        assert_eq!(tree.mod_count(), count);
        assert_eq!(tree.get(&1).map(String::as_str), Some("uno"));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let result: Result<MvrbTree<i32, ()>, _> = MvrbTree::with_config(TreeConfig::new(1));
        assert!(matches!(result, Err(TreeError::InvalidArgument(_))));
    }

    #[test]
    fn test_split_keeps_order() {
        let mut tree = tree_with_capacity(4);
        for k in [50, 10, 40, 20, 30, 60, 70, 15, 35, 55] {
            tree.insert(k, k.to_string()).expect("insert should succeed");
        }
        assert!(tree.stats().splits >= 2);
        assert!(tree.page_count() >= 3);
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, vec![10, 15, 20, 30, 35, 40, 50, 55, 60, 70]);
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_neighbour_page_absorbs_insert() {
        let mut tree = tree_with_capacity(4);
        for k in [10, 20, 30, 40] {
            tree.insert(k, String::new()).expect("insert should succeed");
        }
        // Splits [10, 20, 30, 40] into [10, 20] and [30, 40, 50].
        tree.insert(50, String::new()).expect("insert should succeed");
        tree.insert(25, String::new()).expect("insert should succeed");
        let pages = tree.page_count();
        assert_eq!(pages, 2);

        // 22 lands at slot 0 of the full right page; its predecessor has room.
        tree.insert(22, String::new()).expect("insert should succeed");
        assert_eq!(tree.page_count(), pages);
        let root = tree.root.expect("non-empty tree");
        assert_eq!(tree.page(root).keys(), &[10, 20, 22]);
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_remove_and_pop() {
        let mut tree = tree_with_capacity(3);
        for k in 0..30 {
            tree.insert(k, k.to_string()).expect("insert should succeed");
        }
        assert_eq!(tree.remove(&7), Some("7".to_string()));
        assert_eq!(tree.remove(&7), None);
        assert_eq!(tree.pop_first(), Some((0, "0".to_string())));
        assert_eq!(tree.pop_last(), Some((29, "29".to_string())));
        assert_eq!(tree.len(), 27);
        assert!(tree.check_invariants().is_empty());

        while tree.pop_first().is_some() {}
        assert!(tree.is_empty());
        assert_eq!(tree.page_count(), 0);
        assert_eq!(tree.first_key(), Err(TreeError::NoSuchElement));
    }

    #[test]
    fn test_remove_from_two_child_page() {
        let mut tree = tree_with_capacity(2);
        for k in 0..40 {
            tree.insert(k, k.to_string()).expect("insert should succeed");
        }
        let root = tree.root.expect("non-empty tree");
        let keys: Vec<i32> = tree.page(root).keys().to_vec();
        for k in &keys {
            tree.remove(k);
        }
        assert!(tree.check_invariants().is_empty());
        for k in 0..40 {
            assert_eq!(tree.contains_key(&k), !keys.contains(&k));
        }
    }

    #[test]
    fn test_navigation() {
        let mut tree = tree_with_capacity(4);
        for k in [10, 20, 30] {
            tree.insert(k, k.to_string()).expect("insert should succeed");
        }
        assert_eq!(tree.floor_key(&25), Some(&20));
        assert_eq!(tree.ceiling_key(&25), Some(&30));
        assert_eq!(tree.higher_key(&30), None);
        assert_eq!(tree.lower_key(&10), None);
        assert_eq!(tree.first_key(), Ok(&10));
        assert_eq!(tree.last_key(), Ok(&30));
    }

    #[test]
    fn test_custom_comparator() {
        let mut tree = MvrbTree::with_comparator(TreeConfig::new(3), |a: &i32, b: &i32| b.cmp(a))
            .expect("valid config");
        for k in 0..20 {
            tree.insert(k, ()).expect("insert should succeed");
        }
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (0..20).rev().collect::<Vec<_>>());
        assert_eq!(tree.ceiling_key(&5), Some(&5));
        assert_eq!(tree.higher_key(&5), Some(&4));
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut tree = tree_with_capacity(4);
        tree.extend((0..10).map(|k| (k, String::new())));
        let count = tree.mod_count();
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.get(&3).is_none());
        assert!(tree.mod_count() > count);
        tree.insert(3, String::new()).expect("insert should succeed");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut tree = tree_with_capacity(4);
        tree.insert(1, "a".to_string()).expect("insert should succeed");
        if let Some(value) = tree.get_mut(&1) {
            value.push('b');
        }
        assert_eq!(tree.get(&1).map(String::as_str), Some("ab"));
        assert!(tree.get_mut(&2).is_none());
    }

    #[test]
    fn test_from_iterator_and_debug() {
        let tree: MvrbTree<i32, i32> = [(2, 20), (1, 10)].into_iter().collect();
        assert_eq!(format!("{tree:?}"), "{1: 10, 2: 20}");
    }

    #[test]
    fn test_duplicate_first_key_aborts_split() {
        let config = TreeConfig::new(4).with_load_factor(1.0);
        let mut tree =
            MvrbTree::from_sorted(config, (0..80).map(|k| (k * 10, k))).expect("valid entries");

        // Twenty full pages; the root holds [360, 370, 380, 390] and splits at 390.
        let root = tree.root.expect("non-empty tree");
        assert!(tree.page(root).is_full());
        let split_key = *tree.page(root).key(3).expect("full page");
        let right = tree.page(root).right.expect("root has a right subtree");
        let (_, value) = tree.page_mut(right).remove(0);
        tree.page_mut(right).insert(0, split_key, value);

        let before: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let (len, pages, mod_count) = (tree.len(), tree.page_count(), tree.mod_count());

        let result = tree.insert(365, -1);
        assert!(matches!(result, Err(TreeError::CorruptTree(_))));

        assert_eq!(tree.len(), len);
        assert_eq!(tree.page_count(), pages);
        assert_eq!(tree.mod_count(), mod_count);
        assert_eq!(tree.stats().splits, 0);
        let after: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(after, before);
        assert_eq!(tree.get(&365), None);
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Reading(f64);

    #[test]
    fn test_comparator_orders_keys_without_ord() {
        let mut tree = MvrbTree::with_comparator(TreeConfig::new(3), |a: &Reading, b: &Reading| {
            a.0.total_cmp(&b.0)
        })
        .expect("valid config");
        for (i, x) in [2.5, -1.0, 7.25, 0.0, 3.5, -4.0, 10.0].into_iter().enumerate() {
            tree.insert(Reading(x), i).expect("insert should succeed");
        }

        let keys: Vec<Reading> = tree.keys().copied().collect();
        let expected: Vec<Reading> =
            [-4.0, -1.0, 0.0, 2.5, 3.5, 7.25, 10.0].into_iter().map(Reading).collect();
        assert_eq!(keys, expected);
        assert_eq!(tree.get(&Reading(3.5)), Some(&4));
        assert_eq!(tree.floor_key(&Reading(3.0)), Some(&Reading(2.5)));
        assert_eq!(tree.remove(&Reading(-1.0)), Some(1));

        let view = tree
            .sub_map(Bound::Included(Reading(0.0)), Bound::Excluded(Reading(7.25)))
            .expect("valid range");
        assert_eq!(view.len(), 3);
        assert!(tree.check_invariants().is_empty());

        let copy = tree.clone();
        assert!(copy.iter().eq(tree.iter()));
    }
}
