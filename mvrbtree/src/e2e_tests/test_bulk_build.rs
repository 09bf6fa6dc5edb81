//! Test building trees from sorted input and cloning them.

use crate::config::TreeConfig;
use crate::e2e_tests::helpers::*;
use crate::error::TreeError;
use crate::tree::MvrbTree;

#[test]
fn test_bulk_build_matches_incremental() {
    let entries: Vec<(i64, i64)> = (0..1000).map(|k| (k * 2, k)).collect();
    let built = MvrbTree::from_sorted(TreeConfig::new(16), entries.clone()).expect("build");

    assert_eq!(built.len(), 1000);
    assert_valid(&built);
    assert!(built.iter().map(|(k, v)| (*k, *v)).eq(entries.iter().copied()));
    assert_eq!(built.get(&500), Some(&250));
    assert_eq!(built.get(&501), None);
}

#[test]
fn test_bulk_build_then_mutate() {
    let mut tree = MvrbTree::from_sorted(TreeConfig::new(6), (0..300).map(|k| (k, k)))
        .expect("build");

    for key in 300..400 {
        tree.insert(key, key).expect("insert");
    }
    for key in (0..400).step_by(2) {
        tree.remove(&key);
    }

    assert_valid(&tree);
    assert_eq!(tree.len(), 200);
    assert_eq!(tree.first_key(), Ok(&1));
    assert_eq!(tree.last_key(), Ok(&399));
}

#[test]
fn test_bulk_build_rejects_unsorted_and_duplicates() {
    let unsorted = MvrbTree::from_sorted(TreeConfig::new(4), vec![(1, ()), (3, ()), (2, ())]);
    assert!(matches!(unsorted, Err(TreeError::InvalidArgument(_))));

    let duplicate = MvrbTree::from_sorted(TreeConfig::new(4), vec![(1, ()), (1, ())]);
    assert!(matches!(duplicate, Err(TreeError::InvalidArgument(_))));
}

#[test]
fn test_clone_is_independent() {
    let mut original = tree_of(4, 0..100);
    let copy = original.clone();

    original.insert(1000, 0).expect("insert");
    original.remove(&0);
    *original.get_mut(&50).expect("present") = -1;

    assert_eq!(copy.len(), 100);
    assert_eq!(copy.get(&0), Some(&0));
    assert_eq!(copy.get(&50), Some(&500));
    assert!(!copy.contains_key(&1000));
    assert_valid(&copy);
    assert_valid(&original);
}
