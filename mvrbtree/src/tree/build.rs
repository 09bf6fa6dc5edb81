//! Bulk construction from sorted input.
//!
//! Entries are spread evenly over the fewest pages that keep every page at
//! or below the split fill, then the pages are linked into a perfectly
//! balanced tree. Only the deepest, possibly incomplete level is colored red.

use std::cmp::Ordering;

use crate::config::TreeConfig;
use crate::error::TreeError;

use super::MvrbTree;
use super::order::KeyOrder;
use super::page::{Color, NodeId, Page};

impl<K: Ord, V> MvrbTree<K, V> {
    /// Build a tree in linear time from entries sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the config is invalid or the keys are not
    /// strictly increasing.
    pub fn from_sorted<I>(config: TreeConfig, entries: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_sorted_with_order(config, KeyOrder::natural(), entries)
    }
}

impl<K, V> MvrbTree<K, V> {
    /// Like [`from_sorted`](Self::from_sorted) but with a custom key order.
    pub fn from_sorted_with_order<I>(
        config: TreeConfig,
        order: KeyOrder<K>,
        entries: I,
    ) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        config.validate()?;
        let entries: Vec<(K, V)> = entries.into_iter().collect();

        if let Some(index) = entries
            .windows(2)
            .position(|pair| order.compare(&pair[0].0, &pair[1].0) != Ordering::Less)
        {
            return Err(TreeError::InvalidArgument(format!(
                "keys are not strictly increasing at index {}",
                index + 1
            )));
        }

        let mut tree = Self::empty(config, order);
        tree.build_from_sorted(entries);
        Ok(tree)
    }

    /// Replace the (empty) tree's content with already-validated entries.
    pub(crate) fn build_from_sorted(&mut self, entries: Vec<(K, V)>) {
        let total = entries.len();
        if total == 0 {
            return;
        }

        let per_page = self.config.split_items();
        let page_count = total.div_ceil(per_page);
        let base = total / page_count;
        let extra = total % page_count;

        let mut entries = entries.into_iter();
        let mut ids = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let fill = base + usize::from(index < extra);
            let mut page = Page::new(self.config.page_size);
            for (key, value) in entries.by_ref().take(fill) {
                page.push(key, value);
            }
            ids.push(self.allocate(page));
        }

        let red_level = compute_red_level(page_count);
        self.root = self.link_sorted(&ids, 0, red_level);
        if let Some(root) = self.root {
            self.page_mut(root).parent = None;
        }
        self.len = total;
        self.mod_count += 1;
        self.cache.clear();

        tracing::debug!(entries = total, pages = page_count, red_level, "bulk built tree");
    }

    /// Link `ids` (pages in key order) into a balanced subtree rooted at the
    /// middle page.
    fn link_sorted(&mut self, ids: &[NodeId], level: usize, red_level: usize) -> Option<NodeId> {
        if ids.is_empty() {
            return None;
        }
        let mid = (ids.len() - 1) / 2;
        let middle = ids[mid];

        let left = self.link_sorted(&ids[..mid], level + 1, red_level);
        let right = self.link_sorted(&ids[mid + 1..], level + 1, red_level);

        let page = self.page_mut(middle);
        page.left = left;
        page.right = right;
        page.color = if level == red_level {
            Color::Red
        } else {
            Color::Black
        };
        for child in [left, right].into_iter().flatten() {
            self.page_mut(child).parent = Some(middle);
        }
        Some(middle)
    }
}

/// The level (root = 0) whose nodes are colored red in a balanced build of
/// `size` nodes: the bottom level when it is not completely filled, and
/// otherwise a level below the leaves so nothing is red.
pub(crate) const fn compute_red_level(size: usize) -> usize {
    let mut level = 0;
    let mut remaining = size;
    while remaining > 0 {
        level += 1;
        remaining = (remaining - 1) / 2;
    }
    level
}

impl<K: Clone, V: Clone> Clone for MvrbTree<K, V> {
    fn clone(&self) -> Self {
        let mut tree = Self::empty(self.config, self.order.clone());
        let entries = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        tree.build_from_sorted(entries);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_red_level() {
        assert_eq!(compute_red_level(0), 0);
        assert_eq!(compute_red_level(1), 1);
        assert_eq!(compute_red_level(2), 1);
        assert_eq!(compute_red_level(3), 2);
        assert_eq!(compute_red_level(6), 2);
        assert_eq!(compute_red_level(7), 3);
    }

    #[test]
    fn test_from_sorted_layout() {
        let entries = (0..100).map(|i| (i, i * 2));
        let tree = MvrbTree::from_sorted(TreeConfig::new(8), entries).expect("sorted input");

        assert_eq!(tree.len(), 100);
        assert!(tree.check_invariants().is_empty());
        assert_eq!(tree.get(&37), Some(&74));
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_from_sorted_rejects_unsorted() {
        let result = MvrbTree::from_sorted(TreeConfig::new(4), vec![(1, ()), (3, ()), (2, ())]);
        assert!(matches!(result, Err(TreeError::InvalidArgument(_))));

        let duplicate = MvrbTree::from_sorted(TreeConfig::new(4), vec![(1, ()), (1, ())]);
        assert!(matches!(duplicate, Err(TreeError::InvalidArgument(_))));
    }

    #[test]
    fn test_from_sorted_empty_and_single() {
        let empty: MvrbTree<i32, ()> =
            MvrbTree::from_sorted(TreeConfig::new(4), Vec::new()).expect("empty input");
        assert!(empty.is_empty());

        let single = MvrbTree::from_sorted(TreeConfig::new(4), vec![(7, "x")]).expect("one entry");
        assert_eq!(single.first_key(), Ok(&7));
        assert!(single.check_invariants().is_empty());
    }

    #[test]
    fn test_from_sorted_every_size_is_balanced() {
        for n in 0..200 {
            let tree = MvrbTree::from_sorted(TreeConfig::new(4), (0..n).map(|i| (i, ())))
                .expect("sorted input");
            assert!(tree.check_invariants().is_empty(), "size {n} violates invariants");
            assert_eq!(tree.len(), usize::try_from(n).expect("non-negative"));
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = MvrbTree::with_config(TreeConfig::new(4)).expect("valid config");
        for k in 0..50 {
            original.insert(k, k).expect("insert should succeed");
        }
        let mut copy = original.clone();
        copy.insert(100, 100).expect("insert should succeed");
        copy.remove(&0);

        assert_eq!(original.len(), 50);
        assert!(original.contains_key(&0));
        assert!(!original.contains_key(&100));
        assert_eq!(copy.len(), 50);
        assert!(copy.check_invariants().is_empty());
    }
}
