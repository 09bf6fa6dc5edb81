//! Test floor, ceiling, higher and lower around stored keys.

use crate::e2e_tests::helpers::*;
use crate::error::TreeError;

#[test]
fn test_navigation_around_three_keys() {
    let tree = tree_of(4, [10, 20, 30]);

    assert_eq!(tree.floor_key(&15), Some(&10));
    assert_eq!(tree.ceiling_key(&15), Some(&20));
    assert_eq!(tree.floor_key(&20), Some(&20));
    assert_eq!(tree.ceiling_key(&20), Some(&20));
    assert_eq!(tree.higher_key(&20), Some(&30));
    assert_eq!(tree.lower_key(&20), Some(&10));

    assert_eq!(tree.floor_key(&5), None);
    assert_eq!(tree.lower_key(&10), None);
    assert_eq!(tree.ceiling_key(&35), None);
    assert_eq!(tree.higher_key(&30), None);

    assert_eq!(tree.ceiling_entry(&11), Some((&20, &200)));
}

#[test]
fn test_navigation_across_pages() {
    let tree = tree_of(3, (0..100).map(|k| k * 10));

    for target in 0..990 {
        let floor = (target / 10) * 10;
        assert_eq!(tree.floor_key(&target), Some(&floor), "floor of {target}");
        let ceiling = (target + 9) / 10 * 10;
        assert_eq!(tree.ceiling_key(&target), Some(&ceiling), "ceiling of {target}");
    }
}

#[test]
fn test_empty_tree_boundaries() {
    let tree = tree_with_page_size::<i64, i64>(4);
    assert_eq!(tree.first_key(), Err(TreeError::NoSuchElement));
    assert_eq!(tree.last_key(), Err(TreeError::NoSuchElement));
    assert_eq!(tree.floor_key(&1), None);
    assert_eq!(tree.ceiling_key(&1), None);
}
