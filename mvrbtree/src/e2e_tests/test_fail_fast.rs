//! Test that cursors notice structural changes they did not make.

use crate::e2e_tests::helpers::*;
use crate::error::TreeError;

#[test]
fn test_cursor_fails_after_insert() {
    let mut tree = tree_of(4, 0..10);
    let mut cursor = tree.cursor();
    assert_eq!(cursor.next(&tree), Ok(Some((&0, &0))));

    tree.insert(100, 0).expect("insert");

    assert_eq!(cursor.next(&tree), Err(TreeError::ConcurrentModification));
}

#[test]
fn test_cursor_fails_after_remove() {
    let mut tree = tree_of(4, 0..10);
    let mut cursor = tree.cursor();
    cursor.next(&tree).expect("next");

    tree.remove(&5);

    assert_eq!(cursor.has_next(&tree), Err(TreeError::ConcurrentModification));
}

#[test]
fn test_cursor_survives_own_removals() {
    let mut tree = tree_of(3, 0..60);
    let mut cursor = tree.cursor();
    let mut seen = Vec::new();

    while let Some((key, _)) = cursor.next(&tree).expect("next") {
        let key = *key;
        seen.push(key);
        if key % 4 != 0 {
            cursor.remove(&mut tree).expect("remove");
        }
    }

    assert_eq!(seen, (0..60).collect::<Vec<_>>());
    assert_eq!(keys_of(&tree), (0..60).step_by(4).collect::<Vec<_>>());
    assert_valid(&tree);
}

#[test]
fn test_remove_without_next_is_illegal() {
    let mut tree = tree_of(4, 0..3);
    let mut cursor = tree.cursor();
    assert!(matches!(
        cursor.remove(&mut tree),
        Err(TreeError::IllegalState(_))
    ));

    cursor.next(&tree).expect("next");
    cursor.remove(&mut tree).expect("remove");
    assert!(matches!(
        cursor.remove(&mut tree),
        Err(TreeError::IllegalState(_))
    ));
}
