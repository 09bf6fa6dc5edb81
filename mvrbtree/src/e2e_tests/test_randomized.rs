//! Test random operation sequences against `BTreeMap`.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::e2e_tests::helpers::*;

#[test]
fn test_random_operations_match_btreemap() {
    for (seed, page_size) in [(1, 2), (2, 3), (3, 7), (4, 16)] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tree = tree_with_page_size::<i64, u32>(page_size);
        let mut oracle = BTreeMap::new();

        for step in 0..4_000 {
            let key = rng.random_range(0..500);
            if rng.random::<f64>() < 0.6 {
                let value = rng.random::<u32>();
                assert_eq!(
                    tree.insert(key, value).expect("insert"),
                    oracle.insert(key, value)
                );
            } else {
                assert_eq!(tree.remove(&key), oracle.remove(&key));
            }

            if step % 500 == 0 {
                assert_valid(&tree);
            }
        }

        assert_valid(&tree);
        assert_eq!(tree.len(), oracle.len());
        assert!(tree.iter().eq(oracle.iter()), "contents differ for seed {seed}");
    }
}
