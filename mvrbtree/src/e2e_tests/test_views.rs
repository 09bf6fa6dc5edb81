//! Test bounded views over a tree.

use std::ops::Bound;

use crate::e2e_tests::helpers::*;
use crate::error::TreeError;

#[test]
fn test_tail_map_contains_only_upper_keys() {
    let mut tree = tree_of(4, (1..=20).map(|k| k * 5));

    {
        let tail = tree.tail_map(Bound::Included(50));
        assert_eq!(tail.len(), 11);
        assert!(tail.contains_key(&50));
        assert!(!tail.contains_key(&45));
        assert_eq!(tail.first_key(), Ok(&50));
        assert_eq!(tail.floor_key(&47), None);
    }

    let mut tail = tree.tail_map_mut(Bound::Included(50));
    assert_eq!(tail.insert(5, 0), Err(TreeError::KeyOutOfRange));
    assert_eq!(tail.insert(52, 520), Ok(None));
    assert_eq!(tail.len(), 12);

    assert_eq!(tree.get(&52), Some(&520));
    assert_eq!(tree.len(), 21);
    assert_valid(&tree);
}

#[test]
fn test_sub_map_tracks_tree_changes() {
    let mut tree = tree_of(4, 0..100);
    assert_eq!(
        tree.sub_map(Bound::Included(10), Bound::Excluded(20))
            .expect("range")
            .len(),
        10
    );

    tree.remove(&15);
    tree.insert(1000, 0).expect("insert");

    let view = tree
        .sub_map(Bound::Included(10), Bound::Excluded(20))
        .expect("range");
    assert_eq!(view.len(), 9);
    assert_eq!(
        view.keys().copied().collect::<Vec<_>>(),
        vec![10, 11, 12, 13, 14, 16, 17, 18, 19]
    );
}

#[test]
fn test_inverted_sub_map_rejected() {
    let tree = tree_of(4, 0..10);
    assert!(matches!(
        tree.sub_map(Bound::Included(8), Bound::Included(2)),
        Err(TreeError::InvalidArgument(_))
    ));
}

#[test]
fn test_descending_key_set() {
    let tree = tree_of(4, 0..10);
    let keys = tree.descending_key_set();
    assert_eq!(keys.iter().copied().collect::<Vec<_>>(), (0..10).rev().collect::<Vec<_>>());
    assert_eq!(keys.first(), Ok(&9));
    assert_eq!(keys.higher(&5), Some(&4));
}

#[test]
fn test_pop_through_mutable_view() {
    let mut tree = tree_of(4, 0..30);
    let mut middle = tree
        .sub_map_mut(Bound::Included(10), Bound::Excluded(20))
        .expect("range");

    assert_eq!(middle.pop_first(), Some((10, 100)));
    assert_eq!(middle.pop_last(), Some((19, 190)));
    assert_eq!(middle.len(), 8);

    assert_eq!(tree.len(), 28);
    assert_valid(&tree);
}
