//! Iteration over tree entries.
//!
//! [`Iter`], [`Keys`] and [`Values`] borrow the tree and walk slot by slot,
//! stepping to the structural successor (or predecessor) page at a page
//! boundary. The borrow checker keeps the tree unchanged while they live.
//!
//! [`Cursor`] is detached: it holds positions only and takes the tree on each
//! call, so it can remove or update entries as it goes. It records the
//! tree's modification counter and fails fast if anything else changed the
//! tree in between.

use crate::error::TreeError;
use crate::tree::{MvrbTree, Position};

/// Iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Borrowing iterator over `(key, value)` pairs.
pub struct Iter<'a, K, V> {
    tree: &'a MvrbTree<K, V>,
    next: Option<Position>,
    /// Last position to yield, inclusive.
    end: Option<Position>,
    descending: bool,
}

impl<'a, K, V> Iter<'a, K, V> {
    /// Iterate from `start` to `end` inclusive. Either being `None` yields
    /// nothing.
    pub(crate) fn new(
        tree: &'a MvrbTree<K, V>,
        start: Option<Position>,
        end: Option<Position>,
        descending: bool,
    ) -> Self {
        Self {
            tree,
            next: end.and(start),
            end,
            descending,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.next?;
        let entry = self.tree.entry_at(position)?;

        self.next = if Some(position) == self.end {
            None
        } else if self.descending {
            self.tree.prev_position(position)
        } else {
            self.tree.next_position(position)
        };
        Some(entry)
    }
}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

/// Borrowing iterator over keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) const fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// Borrowing iterator over values, in key order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) const fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// A detached, fail-fast cursor that can remove or update entries.
///
/// ```
/// use mvrbtree::MvrbTree;
///
/// let mut tree: MvrbTree<i32, i32> = (0..10).map(|k| (k, k)).collect();
/// let mut cursor = tree.cursor();
/// while let Some((key, _)) = cursor.next(&tree)? {
///     if key % 2 == 0 {
///         cursor.remove(&mut tree)?;
///     }
/// }
/// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
/// # Ok::<(), mvrbtree::TreeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Cursor {
    next: Option<Position>,
    last_returned: Option<Position>,
    expected_mod_count: u64,
    direction: Direction,
}

impl Cursor {
    pub(crate) const fn new(start: Option<Position>, mod_count: u64, direction: Direction) -> Self {
        Self {
            next: start,
            last_returned: None,
            expected_mod_count: mod_count,
            direction,
        }
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    fn check<K, V>(&self, tree: &MvrbTree<K, V>) -> Result<(), TreeError> {
        if tree.mod_count() == self.expected_mod_count {
            Ok(())
        } else {
            Err(TreeError::ConcurrentModification)
        }
    }

    /// Whether another entry remains.
    pub fn has_next<K, V>(&self, tree: &MvrbTree<K, V>) -> Result<bool, TreeError> {
        self.check(tree)?;
        Ok(self.next.is_some())
    }

    /// Advance and return the next entry.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the tree changed since the cursor
    /// was created or last removed an entry.
    pub fn next<'a, K, V>(
        &mut self,
        tree: &'a MvrbTree<K, V>,
    ) -> Result<Option<(&'a K, &'a V)>, TreeError> {
        self.check(tree)?;
        let Some(position) = self.next else {
            return Ok(None);
        };
        let entry = tree
            .entry_at(position)
            .ok_or(TreeError::ConcurrentModification)?;

        self.last_returned = Some(position);
        self.next = match self.direction {
            Direction::Ascending => tree.next_position(position),
            Direction::Descending => tree.prev_position(position),
        };
        Ok(Some(entry))
    }

    /// Remove the entry last returned by [`next`](Self::next).
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if `next` has not returned an entry since the
    /// last `remove` or `update`, and `ConcurrentModification` if the tree
    /// changed behind the cursor.
    pub fn remove<K, V>(&mut self, tree: &mut MvrbTree<K, V>) -> Result<(K, V), TreeError> {
        self.check(tree)?;
        let removed = self
            .last_returned
            .take()
            .ok_or(TreeError::IllegalState("remove without a preceding next"))?;

        let removal = tree.delete_at(removed);
        if let Some(next) = self.next.as_mut() {
            // Later slots of the same page shifted left.
            if next.node == removed.node && next.slot > removed.slot {
                next.slot -= 1;
            }
            if let Some((from, into)) = removal.relocated {
                if next.node == from {
                    next.node = into;
                }
            }
        }
        self.expected_mod_count = tree.mod_count();
        Ok((removal.key, removal.value))
    }

    /// Replace the value of the entry last returned by [`next`](Self::next),
    /// returning the old value.
    pub fn update<K, V>(&mut self, tree: &mut MvrbTree<K, V>, value: V) -> Result<V, TreeError> {
        self.check(tree)?;
        let position = self
            .last_returned
            .take()
            .ok_or(TreeError::IllegalState("update without a preceding next"))?;
        let slot = tree
            .value_at_mut(position)
            .ok_or(TreeError::ConcurrentModification)?;
        Ok(std::mem::replace(slot, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;

    fn tree_of(n: i32, capacity: usize) -> MvrbTree<i32, i32> {
        let mut tree = MvrbTree::with_config(TreeConfig::new(capacity)).expect("valid config");
        for k in 0..n {
            tree.insert(k, k * 10).expect("insert should succeed");
        }
        tree
    }

    #[test]
    fn test_iter_both_directions() {
        let tree = tree_of(25, 4);
        let ascending: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let descending: Vec<i32> = tree.iter_rev().map(|(k, _)| *k).collect();
        assert_eq!(ascending, (0..25).collect::<Vec<_>>());
        assert_eq!(descending, (0..25).rev().collect::<Vec<_>>());
        assert_eq!(tree.values().copied().sum::<i32>(), (0..25).map(|k| k * 10).sum());
    }

    #[test]
    fn test_iter_empty() {
        let tree = tree_of(0, 4);
        assert_eq!(tree.iter().count(), 0);
        assert_eq!((&tree).into_iter().count(), 0);
    }

    #[test]
    fn test_cursor_remove_every_other() {
        let mut tree = tree_of(40, 3);
        let mut cursor = tree.cursor();
        let mut seen = Vec::new();
        while let Some((k, _)) = cursor.next(&tree).expect("no concurrent change") {
            let k = *k;
            seen.push(k);
            if k % 2 == 0 {
                cursor.remove(&mut tree).expect("remove should succeed");
            }
        }
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
        assert_eq!(tree.len(), 20);
        assert!(tree.keys().all(|k| k % 2 == 1));
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn test_cursor_remove_all() {
        let mut tree = tree_of(60, 2);
        let mut cursor = tree.cursor();
        let mut removed = 0;
        while cursor.next(&tree).expect("no concurrent change").is_some() {
            cursor.remove(&mut tree).expect("remove should succeed");
            removed += 1;
        }
        assert_eq!(removed, 60);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_descending_cursor_remove() {
        let mut tree = tree_of(30, 4);
        let mut cursor = tree.descending_cursor();
        let mut seen = Vec::new();
        while let Some((k, _)) = cursor.next(&tree).expect("no concurrent change") {
            let k = *k;
            seen.push(k);
            if k % 3 == 0 {
                cursor.remove(&mut tree).expect("remove should succeed");
            }
        }
        assert_eq!(seen, (0..30).rev().collect::<Vec<_>>());
        assert!(tree.keys().all(|k| k % 3 != 0));
        assert_eq!(cursor.direction(), Direction::Descending);
    }

    #[test]
    fn test_cursor_update() {
        let mut tree = tree_of(5, 4);
        let mut cursor = tree.cursor();
        while cursor.next(&tree).expect("no concurrent change").is_some() {
            let old = cursor.update(&mut tree, -1).expect("update should succeed");
            assert!(old >= 0);
        }
        assert!(tree.values().all(|v| *v == -1));
    }

    #[test]
    fn test_cursor_illegal_state() {
        let mut tree = tree_of(5, 4);
        let mut cursor = tree.cursor();
        assert!(matches!(
            cursor.remove(&mut tree),
            Err(TreeError::IllegalState(_))
        ));

        cursor.next(&tree).expect("no concurrent change");
        cursor.remove(&mut tree).expect("remove should succeed");
        assert!(matches!(
            cursor.remove(&mut tree),
            Err(TreeError::IllegalState(_))
        ));
        assert!(matches!(
            cursor.update(&mut tree, 0),
            Err(TreeError::IllegalState(_))
        ));
    }

    #[test]
    fn test_cursor_fails_fast() {
        let mut tree = tree_of(10, 4);
        let mut cursor = tree.cursor();
        cursor.next(&tree).expect("no concurrent change");

        tree.insert(100, 0).expect("insert should succeed");
        assert_eq!(cursor.next(&tree), Err(TreeError::ConcurrentModification));
        assert_eq!(cursor.has_next(&tree), Err(TreeError::ConcurrentModification));
    }

    #[test]
    fn test_cursor_ignores_value_replacement() {
        let mut tree = tree_of(10, 4);
        let mut cursor = tree.cursor();
        cursor.next(&tree).expect("no concurrent change");

        tree.insert(5, 0).expect("insert should succeed");
        assert!(cursor.next(&tree).is_ok());
    }
}
