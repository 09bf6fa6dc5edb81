//! Test partial-key lookups over composite keys.

use crate::e2e_tests::helpers::*;
use crate::key::CompositeKey;
use crate::tree::{MvrbTree, PartialSearchMode};

fn sample_tree() -> MvrbTree<CompositeKey, i64> {
    let mut tree = tree_with_page_size(4);
    for (number, text, value) in [
        (0, "z", 0),
        (1, "a", 1),
        (1, "b", 2),
        (1, "c", 3),
        (2, "a", 4),
    ] {
        tree.insert(pair(number, text), value).expect("insert");
    }
    tree
}

#[test]
fn test_partial_boundaries() {
    let tree = sample_tree();
    let prefix = CompositeKey::from(1);

    let (key, value) = tree
        .get_entry_partial(&prefix, PartialSearchMode::LowestBoundary)
        .expect("match");
    assert_eq!(key.keys(), pair(1, "a").keys());
    assert_eq!(*value, 1);

    let (key, value) = tree
        .get_entry_partial(&prefix, PartialSearchMode::HighestBoundary)
        .expect("match");
    assert_eq!(key.keys(), pair(1, "c").keys());
    assert_eq!(*value, 3);

    let (key, _) = tree
        .get_entry_partial(&prefix, PartialSearchMode::None)
        .expect("match");
    assert!(
        [pair(1, "a"), pair(1, "b"), pair(1, "c")]
            .iter()
            .any(|candidate| candidate.keys() == key.keys())
    );
}

#[test]
fn test_partial_miss() {
    let tree = sample_tree();
    let prefix = CompositeKey::from(7);
    assert_eq!(
        tree.get_entry_partial(&prefix, PartialSearchMode::LowestBoundary),
        None
    );
}

#[test]
fn test_full_key_lookup_is_exact() {
    let tree = sample_tree();
    assert_eq!(tree.get(&pair(1, "b")), Some(&2));
    assert_eq!(tree.get(&pair(1, "d")), None);
}

#[test]
fn test_sentinels_fence_a_prefix() {
    let tree = sample_tree();
    let low = CompositeKey::from(1).with_key(CompositeKey::always_less());
    let high = CompositeKey::from(1).with_key(CompositeKey::always_greater());

    let first = tree.ceiling_key(&low).expect("ceiling");
    let last = tree.floor_key(&high).expect("floor");
    assert_eq!(first.keys(), pair(1, "a").keys());
    assert_eq!(last.keys(), pair(1, "c").keys());
}
