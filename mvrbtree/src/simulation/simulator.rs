//! Simulation harness: runs a workload against a tree and a `BTreeMap`
//! oracle side by side and records every disagreement.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::config::{SimulationSettings, TreeConfig};
use crate::error::TreeError;
use crate::stats::StatsSnapshot;
use crate::tree::MvrbTree;

use super::workload::{Navigation, Operation, WorkloadConfig, WorkloadGenerator};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Number of operations to run.
    pub operations: usize,
    /// Run the structural checker every this many operations.
    pub check_every: usize,
    /// Page layout of the tree under test.
    pub tree: TreeConfig,
    pub workload: WorkloadConfig,
}

impl SimulatorConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            operations: SimulationSettings::DEFAULT_OPERATIONS,
            check_every: SimulationSettings::DEFAULT_CHECK_EVERY,
            tree: TreeConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_operations(mut self, operations: usize) -> Self {
        self.operations = operations;
        self
    }

    #[must_use]
    pub const fn with_check_every(mut self, check_every: usize) -> Self {
        self.check_every = check_every;
        self
    }

    #[must_use]
    pub const fn with_tree_config(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }

    #[must_use]
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = workload;
        self
    }
}

impl From<SimulationSettings> for SimulatorConfig {
    fn from(settings: SimulationSettings) -> Self {
        Self::new(settings.seed)
            .with_operations(settings.operations)
            .with_check_every(settings.check_every)
            .with_tree_config(settings.tree)
    }
}

/// A disagreement with the oracle or a broken structural invariant.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations applied.
    pub operations_run: usize,
    /// Entries left in the tree.
    pub final_len: usize,
    /// Violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
    /// Tree counters at the end of the run.
    pub stats: StatsSnapshot,
    /// Error that aborted the run, if any.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Whether the run finished with no violations.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.invariant_violations.is_empty()
    }
}

/// Applies generated operations to a tree and an oracle map.
pub struct Simulator {
    config: SimulatorConfig,
    generator: WorkloadGenerator,
    tree: MvrbTree<i64, u64>,
    oracle: BTreeMap<i64, u64>,
    violations: Vec<InvariantViolation>,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the tree config is invalid.
    pub fn new(config: SimulatorConfig) -> Result<Self, TreeError> {
        let tree = MvrbTree::with_config(config.tree)?;
        let generator = WorkloadGenerator::with_config(config.seed, config.workload.clone());
        Ok(Self {
            config,
            generator,
            tree,
            oracle: BTreeMap::new(),
            violations: Vec::new(),
        })
    }

    /// The tree under test.
    #[must_use]
    pub const fn tree(&self) -> &MvrbTree<i64, u64> {
        &self.tree
    }

    /// Run the configured number of operations.
    pub fn run(&mut self) -> SimulationResult {
        tracing::info!(
            seed = self.config.seed,
            operations = self.config.operations,
            page_size = self.config.tree.page_size,
            "starting simulation"
        );

        let check_every = self.config.check_every.max(1);
        let mut error = None;
        let mut operations_run = 0;

        for index in 0..self.config.operations {
            let operation = self.generator.next_operation();
            if let Err(e) = self.apply(index, operation) {
                error = Some(format!("operation {index} ({operation:?}) failed: {e}"));
                break;
            }
            operations_run += 1;
            if (index + 1) % check_every == 0 {
                self.check_structure(index);
            }
        }

        self.check_structure(operations_run);
        self.check_contents(operations_run);

        let result = SimulationResult {
            seed: self.config.seed,
            operations_run,
            final_len: self.tree.len(),
            invariant_violations: std::mem::take(&mut self.violations),
            stats: self.tree.stats(),
            error,
        };
        tracing::info!(
            operations = result.operations_run,
            final_len = result.final_len,
            violations = result.invariant_violations.len(),
            splits = result.stats.splits,
            cache_hits = result.stats.cache_hits,
            "simulation finished"
        );
        result
    }

    fn record(&mut self, operation_index: usize, description: &str, context: String) {
        tracing::warn!(operation_index, %context, "{description}");
        self.violations.push(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    fn expect_eq<T: PartialEq + std::fmt::Debug>(
        &mut self,
        index: usize,
        operation: Operation,
        tree: T,
        oracle: T,
    ) {
        if tree != oracle {
            self.record(
                index,
                "tree disagrees with oracle",
                format!("{operation:?}: tree {tree:?}, oracle {oracle:?}"),
            );
        }
    }

    fn apply(&mut self, index: usize, operation: Operation) -> Result<(), TreeError> {
        match operation {
            Operation::Insert { key, value } => {
                let tree = self.tree.insert(key, value)?;
                let oracle = self.oracle.insert(key, value);
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::Remove { key } => {
                let tree = self.tree.remove(&key);
                let oracle = self.oracle.remove(&key);
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::Get { key } => {
                let tree = self.tree.get(&key).copied();
                let oracle = self.oracle.get(&key).copied();
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::Navigate { kind, key } => {
                let tree = match kind {
                    Navigation::Floor => self.tree.floor_entry(&key),
                    Navigation::Ceiling => self.tree.ceiling_entry(&key),
                    Navigation::Higher => self.tree.higher_entry(&key),
                    Navigation::Lower => self.tree.lower_entry(&key),
                }
                .map(|(k, v)| (*k, *v));
                let range = match kind {
                    Navigation::Floor => (Bound::Unbounded, Bound::Included(key)),
                    Navigation::Ceiling => (Bound::Included(key), Bound::Unbounded),
                    Navigation::Higher => (Bound::Excluded(key), Bound::Unbounded),
                    Navigation::Lower => (Bound::Unbounded, Bound::Excluded(key)),
                };
                let mut candidates = self.oracle.range(range);
                let oracle = match kind {
                    Navigation::Floor | Navigation::Lower => candidates.next_back(),
                    Navigation::Ceiling | Navigation::Higher => candidates.next(),
                }
                .map(|(k, v)| (*k, *v));
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::PopFirst => {
                let tree = self.tree.pop_first();
                let oracle = self.oracle.pop_first();
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::PopLast => {
                let tree = self.tree.pop_last();
                let oracle = self.oracle.pop_last();
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::RangeCount { lo, hi } => {
                let tree = self
                    .tree
                    .sub_map(Bound::Included(lo), Bound::Excluded(hi))?
                    .len();
                let oracle = self.oracle.range(lo..hi).count();
                self.expect_eq(index, operation, tree, oracle);
            }
            Operation::Sweep { modulus } => {
                let mut cursor = self.tree.cursor();
                let mut removed = 0;
                while let Some((key, _)) = cursor.next(&self.tree)? {
                    if key % modulus == 0 {
                        cursor.remove(&mut self.tree)?;
                        removed += 1;
                    }
                }
                let before = self.oracle.len();
                self.oracle.retain(|key, _| key % modulus != 0);
                self.expect_eq(index, operation, removed, before - self.oracle.len());
            }
        }

        let (tree_len, oracle_len) = (self.tree.len(), self.oracle.len());
        self.expect_eq(index, operation, tree_len, oracle_len);
        Ok(())
    }

    fn check_structure(&mut self, index: usize) {
        for violation in self.tree.check_invariants() {
            self.record(index, "structural invariant broken", violation.to_string());
        }
    }

    fn check_contents(&mut self, index: usize) {
        if !self.tree.iter().eq(self.oracle.iter()) {
            let first_difference = self
                .tree
                .iter()
                .zip(self.oracle.iter())
                .position(|(a, b)| a != b);
            self.record(
                index,
                "final contents differ from oracle",
                format!("first differing entry at index {first_difference:?}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_pages_pass() {
        let config = SimulatorConfig::new(1)
            .with_operations(3_000)
            .with_check_every(50)
            .with_tree_config(TreeConfig::new(4));
        let mut simulator = Simulator::new(config).expect("valid config");
        let result = simulator.run();
        assert!(result.passed(), "violations: {:?}", result.invariant_violations);
        assert_eq!(result.operations_run, 3_000);
        assert!(result.stats.splits > 0);
    }

    #[test]
    fn test_many_seeds() {
        for seed in 0..8 {
            let config = SimulatorConfig::new(seed)
                .with_operations(1_000)
                .with_check_every(100)
                .with_tree_config(TreeConfig::new(2 + usize::try_from(seed).expect("small seed")));
            let mut simulator = Simulator::new(config).expect("valid config");
            let result = simulator.run();
            assert!(result.passed(), "seed {seed} failed: {:?}", result.invariant_violations);
        }
    }

    #[test]
    fn test_invalid_tree_config_rejected() {
        let config = SimulatorConfig::new(1).with_tree_config(TreeConfig::new(0));
        assert!(Simulator::new(config).is_err());
    }

    #[test]
    fn test_deterministic_final_state() {
        let run = |seed| {
            let config = SimulatorConfig::new(seed)
                .with_operations(500)
                .with_tree_config(TreeConfig::new(5));
            let mut simulator = Simulator::new(config).expect("valid config");
            simulator.run();
            simulator.tree().iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
