#![cfg_attr(test, allow(clippy::disallowed_methods, clippy::expect_used))]
// Layout of the crate:
//
//  - `tree`: the paged red-black tree itself. Each node holds a sorted page
//    of entries; the red-black shape is maintained over pages.
//  - `iter` / `view`: ordered iteration, fail-fast cursors and bounded
//    sub-map views over a tree.
//  - `key`: composite keys with partial-prefix ordering.
//  - `snapshot`: checksummed binary dump and bulk reload.
//  - `simulation`: seeded workload runner checked against `BTreeMap`.
//
// Life of an insert:
// 1. Descend pages comparing against each page's first and last key
// 2. Binary or linear search inside the target page
// 3. Insert into the page, the neighbour page, or a freshly split sibling
// 4. Recolor and rotate pages to restore the red-black invariants

pub mod config;
pub mod error;
pub mod iter;
pub mod key;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod tree;
pub mod view;

mod e2e_tests;

pub use config::{ConfigError, SimulationSettings, TreeConfig};
pub use error::TreeError;
pub use iter::{Cursor, Direction, Iter, Keys, Values};
pub use key::{CompositeKey, KeyValue, ValueKind};
pub use snapshot::{SnapshotCodec, SnapshotError};
pub use stats::{StatsSnapshot, TreeStats};
pub use tree::{KeyOrder, MvrbTree, PartialSearchMode, StructureViolation};
pub use view::{KeySet, RangeSpec, SubMap, SubMapMut};
