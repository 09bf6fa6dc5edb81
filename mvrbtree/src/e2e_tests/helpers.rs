//! Common helpers for end-to-end tests.

use crate::config::TreeConfig;
use crate::key::CompositeKey;
use crate::tree::MvrbTree;

/// An empty tree whose pages hold `page_size` entries.
#[must_use]
pub fn tree_with_page_size<K: Ord, V>(page_size: usize) -> MvrbTree<K, V> {
    MvrbTree::with_config(TreeConfig::new(page_size)).expect("valid page size")
}

/// A tree holding `key -> key * 10` for every key, inserted in the given order.
#[must_use]
pub fn tree_of(page_size: usize, keys: impl IntoIterator<Item = i64>) -> MvrbTree<i64, i64> {
    let mut tree = tree_with_page_size(page_size);
    for key in keys {
        tree.insert(key, key * 10).expect("insert");
    }
    tree
}

/// Panic with every violation if the tree's structure is broken.
pub fn assert_valid<K, V>(tree: &MvrbTree<K, V>) {
    let violations = tree.check_invariants();
    assert!(violations.is_empty(), "structure violations: {violations:?}");
}

/// Keys in iteration order.
#[must_use]
pub fn keys_of(tree: &MvrbTree<i64, i64>) -> Vec<i64> {
    tree.keys().copied().collect()
}

/// A two-component key `(number, text)`.
#[must_use]
pub fn pair(number: i64, text: &str) -> CompositeKey {
    CompositeKey::from(number).with_key(text)
}
