//! Test restoring a tree from a snapshot into a different page layout.

use crate::config::TreeConfig;
use crate::e2e_tests::helpers::*;
use crate::snapshot::SnapshotError;
use crate::tree::MvrbTree;

#[test]
fn test_restore_with_different_page_size() {
    let mut tree = tree_of(4, 0..500);
    for key in (0..500).step_by(7) {
        tree.remove(&key);
    }

    let mut bytes = Vec::new();
    tree.write_snapshot(&mut bytes).expect("write");

    let restored: MvrbTree<i64, i64> =
        MvrbTree::read_snapshot(&mut bytes.as_slice(), TreeConfig::new(32)).expect("read");

    assert_eq!(restored.len(), tree.len());
    assert!(restored.iter().eq(tree.iter()));
    assert!(restored.page_count() < tree.page_count());
    assert_valid(&restored);
}

#[test]
fn test_flipped_bit_detected() {
    let tree = tree_of(4, 0..20);
    let mut bytes = Vec::new();
    tree.write_snapshot(&mut bytes).expect("write");

    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x01;

    let result = MvrbTree::<i64, i64>::read_snapshot(&mut bytes.as_slice(), TreeConfig::new(4));
    assert!(matches!(result, Err(SnapshotError::ChecksumMismatch { .. })));
}
