//! Test that small pages split and stay balanced.

use crate::e2e_tests::helpers::*;

#[test]
fn test_small_pages_split() {
    let tree = tree_of(4, 1..=20);

    assert!(tree.stats().splits >= 3);
    assert!(tree.page_count() >= 5);
    assert_eq!(keys_of(&tree), (1..=20).collect::<Vec<_>>());
    assert_valid(&tree);
}

#[test]
fn test_descending_inserts_split() {
    let tree = tree_of(4, (1..=200).rev());

    assert!(tree.page_count() >= 50);
    assert_eq!(tree.first_key(), Ok(&1));
    assert_eq!(tree.last_key(), Ok(&200));
    assert_valid(&tree);
}

#[test]
fn test_minimum_page_size() {
    let mut tree = tree_with_page_size::<i64, i64>(2);
    for key in [5, 1, 9, 3, 7, 2, 8, 4, 6, 0] {
        tree.insert(key, key).expect("insert");
        assert_valid(&tree);
    }
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
}
