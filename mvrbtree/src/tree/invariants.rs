//! Structural self-checks used by tests and the simulation driver.

use std::cmp::Ordering;

use super::MvrbTree;
use super::page::{Color, NodeId};

/// A broken structural property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureViolation {
    /// The root page is red.
    RedRoot,
    /// The root page has a parent link.
    RootHasParent,
    /// A red page has a red child.
    RedRed { node: NodeId },
    /// The two subtrees of a page have different black heights.
    BlackHeight { node: NodeId, left: usize, right: usize },
    /// A child does not point back at its parent.
    BrokenParentLink { node: NodeId },
    /// A linked page has no slots.
    EmptyPage { node: NodeId },
    /// A page holds more slots than its capacity.
    Overflow { node: NodeId, len: usize },
    /// A released arena slot is still linked.
    ReleasedPage { node: NodeId },
    /// Keys are not strictly increasing in iteration order.
    OutOfOrder { node: NodeId, slot: usize },
    /// The recorded length differs from the number of stored pairs.
    SizeMismatch { recorded: usize, counted: usize },
}

impl std::fmt::Display for StructureViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RedRoot => write!(f, "root page is red"),
            Self::RootHasParent => write!(f, "root page has a parent"),
            Self::RedRed { node } => write!(f, "red page {} has a red child", node.index()),
            Self::BlackHeight { node, left, right } => write!(
                f,
                "page {} has black heights {left} (left) and {right} (right)",
                node.index()
            ),
            Self::BrokenParentLink { node } => {
                write!(f, "page {} does not point back at its parent", node.index())
            }
            Self::EmptyPage { node } => write!(f, "page {} is empty", node.index()),
            Self::Overflow { node, len } => {
                write!(f, "page {} holds {len} slots, over capacity", node.index())
            }
            Self::ReleasedPage { node } => write!(f, "released page {} is linked", node.index()),
            Self::OutOfOrder { node, slot } => {
                write!(f, "key at page {} slot {slot} is out of order", node.index())
            }
            Self::SizeMismatch { recorded, counted } => {
                write!(f, "recorded length {recorded} but counted {counted} entries")
            }
        }
    }
}

impl<K, V> MvrbTree<K, V> {
    /// Check every structural invariant, returning all violations found.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<StructureViolation> {
        let mut violations = Vec::new();
        let Some(root) = self.root else {
            if self.len != 0 {
                violations.push(StructureViolation::SizeMismatch {
                    recorded: self.len,
                    counted: 0,
                });
            }
            return violations;
        };

        if self.page(root).color == Color::Red {
            violations.push(StructureViolation::RedRoot);
        }
        if self.page(root).parent.is_some() {
            violations.push(StructureViolation::RootHasParent);
        }
        self.check_subtree(root, &mut violations);

        // Node-local checks passed; ordering and size need an in-order walk.
        if violations.is_empty() {
            self.check_order_and_size(&mut violations);
        }
        violations
    }

    /// Run [`check_invariants`](Self::check_invariants), logging each
    /// violation. Returns whether the tree is sound.
    pub fn check_tree_structure(&self) -> bool {
        let violations = self.check_invariants();
        for violation in &violations {
            tracing::error!(%violation, "tree structure violation");
        }
        violations.is_empty()
    }

    /// Returns the black height of the subtree rooted at `node`.
    fn check_subtree(&self, node: NodeId, violations: &mut Vec<StructureViolation>) -> usize {
        let page = self.page(node);
        if !page.is_alive() {
            violations.push(StructureViolation::ReleasedPage { node });
            return 0;
        }
        if page.is_empty() {
            violations.push(StructureViolation::EmptyPage { node });
        }
        if page.len() > page.capacity() {
            violations.push(StructureViolation::Overflow {
                node,
                len: page.len(),
            });
        }

        let mut heights = [0; 2];
        for (index, child) in [page.left, page.right].into_iter().enumerate() {
            let Some(child) = child else { continue };
            let child_page = self.page(child);
            if child_page.parent != Some(node) {
                violations.push(StructureViolation::BrokenParentLink { node: child });
            }
            if page.color == Color::Red && child_page.color == Color::Red {
                violations.push(StructureViolation::RedRed { node });
            }
            heights[index] = self.check_subtree(child, violations);
        }

        let [left, right] = heights;
        if left != right {
            violations.push(StructureViolation::BlackHeight { node, left, right });
        }
        left + usize::from(page.color == Color::Black)
    }

    fn check_order_and_size(&self, violations: &mut Vec<StructureViolation>) {
        let mut counted = 0;
        let mut previous: Option<&K> = None;
        let mut position = self.first_position();

        while let Some(current) = position {
            if let Some(key) = self.key_at(current) {
                if previous.is_some_and(|prev| self.order.compare(prev, key) != Ordering::Less) {
                    violations.push(StructureViolation::OutOfOrder {
                        node: current.node,
                        slot: current.slot,
                    });
                }
                previous = Some(key);
            }
            counted += 1;
            position = self.next_position(current);
        }

        if counted != self.len {
            violations.push(StructureViolation::SizeMismatch {
                recorded: self.len,
                counted,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;

    #[test]
    fn test_detects_red_root_and_size_mismatch() {
        let mut tree = MvrbTree::with_config(TreeConfig::new(4)).expect("valid config");
        for k in 0..20 {
            tree.insert(k, ()).expect("insert should succeed");
        }
        assert!(tree.check_tree_structure());

        let root = tree.root.expect("non-empty tree");
        tree.page_mut(root).color = Color::Red;
        assert!(tree.check_invariants().contains(&StructureViolation::RedRoot));

        tree.page_mut(root).color = Color::Black;
        tree.len += 1;
        assert_eq!(
            tree.check_invariants(),
            vec![StructureViolation::SizeMismatch {
                recorded: 21,
                counted: 20
            }]
        );
    }

    #[test]
    fn test_detects_broken_parent_link() {
        let mut tree = MvrbTree::with_config(TreeConfig::new(2)).expect("valid config");
        for k in 0..10 {
            tree.insert(k, ()).expect("insert should succeed");
        }
        let root = tree.root.expect("non-empty tree");
        let left = tree.page(root).left.expect("root has a left child");
        tree.page_mut(left).parent = None;

        let violations = tree.check_invariants();
        assert!(violations.contains(&StructureViolation::BrokenParentLink { node: left }));
        assert!(!tree.check_tree_structure());
    }
}
