//! Test that re-inserting a key replaces its value in place.

use crate::e2e_tests::helpers::*;

#[test]
fn test_put_same_key_twice() {
    let mut tree = tree_with_page_size::<i64, &str>(4);

    assert_eq!(tree.insert(5, "first").expect("insert"), None);
    assert_eq!(tree.insert(5, "second").expect("insert"), Some("first"));

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(&5), Some(&"second"));
    assert_eq!(tree.page_count(), 1);
}

#[test]
fn test_repeated_puts_do_not_grow() {
    let mut tree = tree_of(4, 0..50);
    let pages = tree.page_count();

    for round in 1..=3 {
        for key in 0..50 {
            tree.insert(key, key * 10 + round).expect("insert");
        }
    }

    assert_eq!(tree.len(), 50);
    assert_eq!(tree.page_count(), pages);
    assert!(tree.values().all(|v| v % 10 == 3));
    assert_valid(&tree);
}
