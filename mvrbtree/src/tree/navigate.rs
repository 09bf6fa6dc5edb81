//! Structural navigation between pages and slots.

use super::MvrbTree;
use super::page::NodeId;
use super::search::Position;

impl<K, V> MvrbTree<K, V> {
    pub(crate) fn first_node(&self) -> Option<NodeId> {
        let mut node = self.root?;
        while let Some(left) = self.page(node).left {
            node = left;
        }
        Some(node)
    }

    pub(crate) fn last_node(&self) -> Option<NodeId> {
        let mut node = self.root?;
        while let Some(right) = self.page(node).right {
            node = right;
        }
        Some(node)
    }

    /// In-order successor page.
    pub(crate) fn successor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(mut next) = self.page(node).right {
            while let Some(left) = self.page(next).left {
                next = left;
            }
            return Some(next);
        }

        let mut child = node;
        let mut parent = self.page(node).parent;
        while let Some(p) = parent {
            if self.page(p).right != Some(child) {
                break;
            }
            child = p;
            parent = self.page(p).parent;
        }
        parent
    }

    /// In-order predecessor page.
    pub(crate) fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(mut prev) = self.page(node).left {
            while let Some(right) = self.page(prev).right {
                prev = right;
            }
            return Some(prev);
        }

        let mut child = node;
        let mut parent = self.page(node).parent;
        while let Some(p) = parent {
            if self.page(p).left != Some(child) {
                break;
            }
            child = p;
            parent = self.page(p).parent;
        }
        parent
    }

    pub(crate) fn first_position(&self) -> Option<Position> {
        self.first_node().map(|node| Position::new(node, 0))
    }

    pub(crate) fn last_position(&self) -> Option<Position> {
        let node = self.last_node()?;
        let len = self.page(node).len();
        (len > 0).then(|| Position::new(node, len - 1))
    }

    /// The slot after `position`, crossing into the successor page at the end
    /// of a page.
    pub(crate) fn next_position(&self, position: Position) -> Option<Position> {
        if position.slot + 1 < self.page(position.node).len() {
            return Some(Position::new(position.node, position.slot + 1));
        }
        self.successor(position.node)
            .map(|node| Position::new(node, 0))
    }

    /// The slot before `position`, crossing into the predecessor page at the
    /// start of a page.
    pub(crate) fn prev_position(&self, position: Position) -> Option<Position> {
        if position.slot > 0 {
            return Some(Position::new(position.node, position.slot - 1));
        }
        let node = self.predecessor(position.node)?;
        let len = self.page(node).len();
        (len > 0).then(|| Position::new(node, len - 1))
    }

    pub(crate) fn key_at(&self, position: Position) -> Option<&K> {
        self.nodes.get(position.node.index())?.key(position.slot)
    }

    pub(crate) fn entry_at(&self, position: Position) -> Option<(&K, &V)> {
        let page = self.nodes.get(position.node.index())?;
        Some((page.key(position.slot)?, page.value(position.slot)?))
    }

    pub(crate) fn value_at_mut(&mut self, position: Position) -> Option<&mut V> {
        self.nodes.get_mut(position.node.index())?.value_mut(position.slot)
    }

    /// Smallest position whose key is `>= key` (or `> key` when not
    /// `inclusive`).
    pub(crate) fn ceiling_position(&self, key: &K, inclusive: bool) -> Option<Position> {
        let result = self.locate(key);
        let node = result.node?;

        if result.found {
            let position = Position::new(node, result.slot);
            return if inclusive {
                Some(position)
            } else {
                self.next_position(position)
            };
        }
        if result.slot < self.page(node).len() {
            return Some(Position::new(node, result.slot));
        }
        self.successor(node).map(|next| Position::new(next, 0))
    }

    /// Largest position whose key is `<= key` (or `< key` when not
    /// `inclusive`).
    pub(crate) fn floor_position(&self, key: &K, inclusive: bool) -> Option<Position> {
        let result = self.locate(key);
        let node = result.node?;

        if result.found {
            let position = Position::new(node, result.slot);
            return if inclusive {
                Some(position)
            } else {
                self.prev_position(position)
            };
        }
        if result.slot > 0 {
            return Some(Position::new(node, result.slot - 1));
        }
        let prev = self.predecessor(node)?;
        let len = self.page(prev).len();
        (len > 0).then(|| Position::new(prev, len - 1))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TreeConfig;
    use crate::tree::MvrbTree;

    fn tree_of(keys: &[i32]) -> MvrbTree<i32, ()> {
        let mut tree = MvrbTree::with_config(TreeConfig::new(3)).expect("valid config");
        for &k in keys {
            tree.insert(k, ()).expect("insert should succeed");
        }
        tree
    }

    #[test]
    fn test_walk_forward_and_back() {
        let keys: Vec<i32> = (0..30).collect();
        let tree = tree_of(&keys);

        let mut forward = Vec::new();
        let mut position = tree.first_position();
        while let Some(p) = position {
            forward.push(*tree.key_at(p).expect("live position"));
            position = tree.next_position(p);
        }
        assert_eq!(forward, keys);

        let mut backward = Vec::new();
        let mut position = tree.last_position();
        while let Some(p) = position {
            backward.push(*tree.key_at(p).expect("live position"));
            position = tree.prev_position(p);
        }
        backward.reverse();
        assert_eq!(backward, keys);
    }

    #[test]
    fn test_ceiling_and_floor_positions() {
        let tree = tree_of(&[10, 20, 30, 40, 50, 60, 70]);
        let key = |p| tree.key_at(p).copied();

        assert_eq!(tree.ceiling_position(&25, true).and_then(key), Some(30));
        assert_eq!(tree.ceiling_position(&30, true).and_then(key), Some(30));
        assert_eq!(tree.ceiling_position(&30, false).and_then(key), Some(40));
        assert_eq!(tree.ceiling_position(&70, false), None);
        assert_eq!(tree.ceiling_position(&5, true).and_then(key), Some(10));

        assert_eq!(tree.floor_position(&25, true).and_then(key), Some(20));
        assert_eq!(tree.floor_position(&30, false).and_then(key), Some(20));
        assert_eq!(tree.floor_position(&10, false), None);
        assert_eq!(tree.floor_position(&99, true).and_then(key), Some(70));
    }

    #[test]
    fn test_positions_on_empty_tree() {
        let tree = tree_of(&[]);
        assert!(tree.first_position().is_none());
        assert!(tree.last_position().is_none());
        assert!(tree.ceiling_position(&1, true).is_none());
        assert!(tree.floor_position(&1, true).is_none());
    }
}
