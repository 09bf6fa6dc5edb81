//! Seeded workload generation for the simulation driver.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Relative weights of each operation kind and the key space they draw from.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Keys are drawn from `0..key_space`.
    pub key_space: i64,
    pub insert_weight: u32,
    pub remove_weight: u32,
    pub get_weight: u32,
    /// Floor, ceiling, higher and lower lookups.
    pub navigate_weight: u32,
    /// `pop_first` / `pop_last`.
    pub pop_weight: u32,
    /// Counting a random sub-range.
    pub range_weight: u32,
    /// Removing every entry whose key is a multiple of some modulus through a
    /// cursor.
    pub sweep_weight: u32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            key_space: 2_000,
            insert_weight: 40,
            remove_weight: 15,
            get_weight: 20,
            navigate_weight: 15,
            pop_weight: 4,
            range_weight: 5,
            sweep_weight: 1,
        }
    }
}

impl WorkloadConfig {
    const fn total_weight(&self) -> u32 {
        self.insert_weight
            + self.remove_weight
            + self.get_weight
            + self.navigate_weight
            + self.pop_weight
            + self.range_weight
            + self.sweep_weight
    }
}

/// Navigation primitive exercised by [`Operation::Navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Floor,
    Ceiling,
    Higher,
    Lower,
}

impl Navigation {
    const ALL: [Self; 4] = [Self::Floor, Self::Ceiling, Self::Higher, Self::Lower];
}

/// One step of a simulated workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert { key: i64, value: u64 },
    Remove { key: i64 },
    Get { key: i64 },
    Navigate { kind: Navigation, key: i64 },
    PopFirst,
    PopLast,
    /// Count keys in `lo..hi`.
    RangeCount { lo: i64, hi: i64 },
    /// Remove keys divisible by `modulus` with a cursor.
    Sweep { modulus: i64 },
}

/// Produces the same operation sequence for the same seed.
pub struct WorkloadGenerator {
    rng: StdRng,
    config: WorkloadConfig,
}

impl WorkloadGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, WorkloadConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: WorkloadConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    fn random_key(&mut self) -> i64 {
        self.rng.random_range(0..self.config.key_space.max(1))
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let total = self.config.total_weight().max(1);
        let mut pick = self.rng.random_range(0..total);

        let weights = [
            self.config.insert_weight,
            self.config.remove_weight,
            self.config.get_weight,
            self.config.navigate_weight,
            self.config.pop_weight,
            self.config.range_weight,
            self.config.sweep_weight,
        ];
        let mut choice = 0;
        for (index, weight) in weights.into_iter().enumerate() {
            if pick < weight {
                choice = index;
                break;
            }
            pick -= weight;
        }

        match choice {
            0 => Operation::Insert {
                key: self.random_key(),
                value: self.rng.random(),
            },
            1 => Operation::Remove {
                key: self.random_key(),
            },
            3 => Operation::Navigate {
                kind: Navigation::ALL[self.rng.random_range(0..Navigation::ALL.len())],
                key: self.random_key(),
            },
            4 => {
                if self.rng.random::<bool>() {
                    Operation::PopFirst
                } else {
                    Operation::PopLast
                }
            }
            5 => {
                let a = self.random_key();
                let b = self.random_key();
                Operation::RangeCount {
                    lo: a.min(b),
                    hi: a.max(b),
                }
            }
            6 => Operation::Sweep {
                modulus: self.rng.random_range(2..10),
            },
            _ => Operation::Get {
                key: self.random_key(),
            },
        }
    }
}
