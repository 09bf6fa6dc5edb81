//! Lookup and restructuring counters.
//!
//! Counters use `Cell` so read-only lookups can record into them. They never
//! influence control flow.

use std::cell::Cell;
use std::time::Duration;

/// Interior-mutable counters owned by a tree.
#[derive(Debug, Default)]
pub struct TreeStats {
    lookups: Cell<u64>,
    cache_hits: Cell<u64>,
    nodes_visited: Cell<u64>,
    splits: Cell<u64>,
    nodes_removed: Cell<u64>,
    rotations: Cell<u64>,
    lookup_time: Cell<Duration>,
}

/// A point-in-time copy of [`TreeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Key resolutions performed (cache hits included).
    pub lookups: u64,
    /// Lookups answered from the last-search cache.
    pub cache_hits: u64,
    /// Pages visited while descending from the root.
    pub nodes_visited: u64,
    /// Page splits.
    pub splits: u64,
    /// Pages unlinked after becoming empty.
    pub nodes_removed: u64,
    /// Single rotations performed while rebalancing.
    pub rotations: u64,
    /// Wall time spent resolving keys.
    pub lookup_time: Duration,
}

impl StatsSnapshot {
    /// Fraction of lookups served by the cache, `0.0` when there were none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // counters stay far below 2^52
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.lookups as f64
        }
    }
}

fn bump(counter: &Cell<u64>, by: u64) {
    counter.set(counter.get().saturating_add(by));
}

impl TreeStats {
    pub(crate) fn record_lookup(&self, nodes_visited: u64, elapsed: Duration) {
        bump(&self.lookups, 1);
        bump(&self.nodes_visited, nodes_visited);
        self.lookup_time
            .set(self.lookup_time.get().saturating_add(elapsed));
    }

    pub(crate) fn record_cache_hit(&self) {
        bump(&self.cache_hits, 1);
    }

    pub(crate) fn record_split(&self) {
        bump(&self.splits, 1);
    }

    pub(crate) fn record_node_removed(&self) {
        bump(&self.nodes_removed, 1);
    }

    pub(crate) fn record_rotation(&self) {
        bump(&self.rotations, 1);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.get(),
            cache_hits: self.cache_hits.get(),
            nodes_visited: self.nodes_visited.get(),
            splits: self.splits.get(),
            nodes_removed: self.nodes_removed.get(),
            rotations: self.rotations.get(),
            lookup_time: self.lookup_time.get(),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.lookups,
            &self.cache_hits,
            &self.nodes_visited,
            &self.splits,
            &self.nodes_removed,
            &self.rotations,
        ] {
            counter.set(0);
        }
        self.lookup_time.set(Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_reset() {
        let stats = TreeStats::default();
        stats.record_lookup(3, Duration::from_micros(5));
        stats.record_lookup(0, Duration::from_micros(1));
        stats.record_cache_hit();
        stats.record_split();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.lookups, 2);
        assert_eq!(snapshot.nodes_visited, 3);
        assert_eq!(snapshot.splits, 1);
        assert_eq!(snapshot.lookup_time, Duration::from_micros(6));
        assert!((snapshot.cache_hit_ratio() - 0.5).abs() < f64::EPSILON);

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_hit_ratio_without_lookups() {
        assert!(StatsSnapshot::default().cache_hit_ratio().abs() < f64::EPSILON);
    }
}
