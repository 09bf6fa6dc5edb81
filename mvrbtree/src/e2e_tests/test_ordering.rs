//! Test that iteration order and structure survive mixed workloads.

use crate::config::TreeConfig;
use crate::e2e_tests::helpers::*;
use crate::tree::MvrbTree;

#[test]
fn test_shuffled_inserts_iterate_sorted() {
    // 37 is coprime with 1000, so this visits every key once out of order.
    let keys = (0..1000).map(|i| (i * 37) % 1000);
    let tree = tree_of(8, keys);

    assert_eq!(tree.len(), 1000);
    assert_eq!(keys_of(&tree), (0..1000).collect::<Vec<_>>());
    assert_eq!(
        tree.iter_rev().map(|(k, _)| *k).collect::<Vec<_>>(),
        (0..1000).rev().collect::<Vec<_>>()
    );
    assert_valid(&tree);
}

#[test]
fn test_interleaved_removals_keep_invariants() {
    let mut tree = tree_of(5, 0..400);

    for key in (0..400).filter(|k| k % 3 == 0) {
        assert_eq!(tree.remove(&key), Some(key * 10));
    }
    assert_valid(&tree);

    for key in (0..400).filter(|k| k % 3 == 1) {
        assert_eq!(tree.remove(&key), Some(key * 10));
    }
    assert_valid(&tree);

    let expected: Vec<i64> = (0..400).filter(|k| k % 3 == 2).collect();
    assert_eq!(keys_of(&tree), expected);
    assert_eq!(tree.len(), expected.len());
    assert_eq!(tree.iter().count(), tree.len());
}

#[test]
fn test_remove_everything_leaves_empty_tree() {
    let mut tree = tree_of(4, 0..200);
    for key in (0..200).rev() {
        assert!(tree.remove(&key).is_some());
    }
    assert!(tree.is_empty());
    assert_eq!(tree.page_count(), 0);
    assert_eq!(tree.first_entry(), None);
    assert_valid(&tree);

    tree.insert(7, 70).expect("insert");
    assert_eq!(keys_of(&tree), vec![7]);
    assert_valid(&tree);
}

#[test]
fn test_custom_comparator_reverses_order() {
    let mut tree = MvrbTree::with_comparator(TreeConfig::new(4), |a: &i64, b: &i64| b.cmp(a))
        .expect("valid config");
    for key in 0..50 {
        tree.insert(key, ()).expect("insert");
    }

    assert_eq!(
        tree.keys().copied().collect::<Vec<_>>(),
        (0..50).rev().collect::<Vec<_>>()
    );
    assert_eq!(tree.first_key(), Ok(&49));
    // "Higher" follows the tree's order, so it moves toward smaller numbers.
    assert_eq!(tree.higher_key(&10), Some(&9));
    assert_valid(&tree);
}
