//! Deterministic simulation testing for the tree.
//!
//! A seeded [`WorkloadGenerator`] produces a reproducible stream of inserts,
//! removals, lookups, navigation, range counts and cursor sweeps. The
//! [`Simulator`] applies each operation both to an [`MvrbTree`] and to a
//! `BTreeMap` oracle, compares the answers, and periodically runs the
//! tree's structural checker.
//!
//! Given the same seed and configuration, every run is identical.
//!
//! # Usage
//!
//! ```
//! use mvrbtree::TreeConfig;
//! use mvrbtree::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345)
//!     .with_operations(500)
//!     .with_tree_config(TreeConfig::new(4));
//!
//! let mut simulator = Simulator::new(config)?;
//! let result = simulator.run();
//! assert!(result.passed());
//! # Ok::<(), mvrbtree::TreeError>(())
//! ```
//!
//! [`MvrbTree`]: crate::MvrbTree

mod simulator;
mod workload;

pub use simulator::{InvariantViolation, SimulationResult, Simulator, SimulatorConfig};
pub use workload::{Navigation, Operation, WorkloadConfig, WorkloadGenerator};
