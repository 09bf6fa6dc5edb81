//! Red-black rebalancing over the page arena.
//!
//! The helpers treat an absent node as black and ignore writes to it, so the
//! fix-up loops read like the textbook versions without null checks at every
//! step.

use super::MvrbTree;
use super::page::{Color, NodeId};

impl<K, V> MvrbTree<K, V> {
    pub(crate) fn color_of(&self, node: Option<NodeId>) -> Color {
        node.map_or(Color::Black, |id| self.page(id).color)
    }

    pub(crate) fn parent_of(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self.page(id).parent)
    }

    pub(crate) fn left_of(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self.page(id).left)
    }

    pub(crate) fn right_of(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self.page(id).right)
    }

    fn set_color(&mut self, node: Option<NodeId>, color: Color) {
        if let Some(id) = node {
            self.page_mut(id).color = color;
        }
    }

    /// Point `parent`'s link that referenced `old` at `new`, or make `new` the
    /// root when `parent` is absent.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let page = self.page_mut(p);
                if page.left == Some(old) {
                    page.left = new;
                } else if page.right == Some(old) {
                    page.right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, node: Option<NodeId>) {
        let Some(p) = node else { return };
        let Some(r) = self.page(p).right else { return };

        let r_left = self.page(r).left;
        self.page_mut(p).right = r_left;
        if let Some(rl) = r_left {
            self.page_mut(rl).parent = Some(p);
        }
        let grandparent = self.page(p).parent;
        self.page_mut(r).parent = grandparent;
        self.replace_child(grandparent, p, Some(r));
        self.page_mut(r).left = Some(p);
        self.page_mut(p).parent = Some(r);
        self.stats.record_rotation();
    }

    fn rotate_right(&mut self, node: Option<NodeId>) {
        let Some(p) = node else { return };
        let Some(l) = self.page(p).left else { return };

        let l_right = self.page(l).right;
        self.page_mut(p).left = l_right;
        if let Some(lr) = l_right {
            self.page_mut(lr).parent = Some(p);
        }
        let grandparent = self.page(p).parent;
        self.page_mut(l).parent = grandparent;
        self.replace_child(grandparent, p, Some(l));
        self.page_mut(l).right = Some(p);
        self.page_mut(p).parent = Some(l);
        self.stats.record_rotation();
    }

    /// Restore the red-black properties after linking a new red node.
    pub(crate) fn fix_after_insertion(&mut self, node: NodeId) {
        let mut x = Some(node);
        self.set_color(x, Color::Red);

        while x.is_some() && x != self.root && self.color_of(self.parent_of(x)) == Color::Red {
            let parent = self.parent_of(x);
            let grandparent = self.parent_of(parent);

            if parent == self.left_of(grandparent) {
                let uncle = self.right_of(grandparent);
                if self.color_of(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    x = grandparent;
                } else {
                    if x == self.right_of(parent) {
                        x = parent;
                        self.rotate_left(x);
                    }
                    let parent = self.parent_of(x);
                    let grandparent = self.parent_of(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left_of(grandparent);
                if self.color_of(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    x = grandparent;
                } else {
                    if x == self.left_of(parent) {
                        x = parent;
                        self.rotate_right(x);
                    }
                    let parent = self.parent_of(x);
                    let grandparent = self.parent_of(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Restore the red-black properties after removing a black node.
    fn fix_after_deletion(&mut self, node: NodeId) {
        let mut x = Some(node);

        while x.is_some() && x != self.root && self.color_of(x) == Color::Black {
            if x == self.left_of(self.parent_of(x)) {
                let mut sibling = self.right_of(self.parent_of(x));

                if self.color_of(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(self.parent_of(x), Color::Red);
                    self.rotate_left(self.parent_of(x));
                    sibling = self.right_of(self.parent_of(x));
                }

                if self.color_of(self.left_of(sibling)) == Color::Black
                    && self.color_of(self.right_of(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    x = self.parent_of(x);
                } else {
                    if self.color_of(self.right_of(sibling)) == Color::Black {
                        self.set_color(self.left_of(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right_of(self.parent_of(x));
                    }
                    self.set_color(sibling, self.color_of(self.parent_of(x)));
                    self.set_color(self.parent_of(x), Color::Black);
                    self.set_color(self.right_of(sibling), Color::Black);
                    self.rotate_left(self.parent_of(x));
                    x = self.root;
                }
            } else {
                let mut sibling = self.left_of(self.parent_of(x));

                if self.color_of(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(self.parent_of(x), Color::Red);
                    self.rotate_right(self.parent_of(x));
                    sibling = self.left_of(self.parent_of(x));
                }

                if self.color_of(self.right_of(sibling)) == Color::Black
                    && self.color_of(self.left_of(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    x = self.parent_of(x);
                } else {
                    if self.color_of(self.left_of(sibling)) == Color::Black {
                        self.set_color(self.right_of(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left_of(self.parent_of(x));
                    }
                    self.set_color(sibling, self.color_of(self.parent_of(x)));
                    self.set_color(self.parent_of(x), Color::Black);
                    self.set_color(self.left_of(sibling), Color::Black);
                    self.rotate_right(self.parent_of(x));
                    x = self.root;
                }
            }
        }

        self.set_color(x, Color::Black);
    }

    /// Unlink an emptied node from the tree and release its arena slot.
    ///
    /// A node with two children keeps its place: its in-order successor's
    /// slots move into it and the successor is unlinked instead. Returns
    /// `(from, into)` when that happens.
    pub(crate) fn delete_node(&mut self, node: NodeId) -> Option<(NodeId, NodeId)> {
        let mut p = node;
        let mut relocated = None;

        if self.page(p).left.is_some() && self.page(p).right.is_some() {
            if let Some(successor) = self.successor(p) {
                let (into, from) = self.pages_mut(p, successor);
                into.copy_from(from);
                relocated = Some((successor, p));
                p = successor;
            }
        }

        let replacement = self.page(p).left.or(self.page(p).right);
        let parent = self.page(p).parent;

        if let Some(r) = replacement {
            self.page_mut(r).parent = parent;
            self.replace_child(parent, p, Some(r));
            let page = self.page_mut(p);
            page.left = None;
            page.right = None;
            page.parent = None;
            if self.page(p).color == Color::Black {
                self.fix_after_deletion(r);
            }
        } else if parent.is_none() {
            self.root = None;
        } else {
            if self.page(p).color == Color::Black {
                self.fix_after_deletion(p);
            }
            if let Some(parent) = self.page(p).parent {
                self.replace_child(Some(parent), p, None);
                self.page_mut(p).parent = None;
            }
        }

        self.release(p);
        self.stats.record_node_removed();
        tracing::debug!(node = p.index(), relocated = relocated.is_some(), "removed empty page");
        relocated
    }
}
