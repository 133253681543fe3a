// Cyclic Stats Ring - low-passes per-window bucket vectors across a trailing
// window of `cycleCount` fingerprints, phase-aligned so the "current" slot
// rotates every window.
//
// Ported from `FingerprintAccumulateStats`/`FingerprintResetStats` in the
// original AudioId source.

use crate::stats::RunningStats;

/// A ring of `cycle_count` parallel bucket-stat accumulators.
///
/// Each slot holds between 0 and `cycle_count` accumulated windows; the slot
/// that was just reset-then-repopulated is the "current" smoothed view
/// (see [`CycleRing::stats`]).
pub struct CycleRing {
    bucket_count: usize,
    cycle_count: usize,
    ring: Vec<Vec<RunningStats>>,
    cycle: usize,
}

impl CycleRing {
    pub fn new(bucket_count: usize, cycle_count: usize) -> Self {
        assert!(cycle_count >= 1, "cycle_count must be at least 1");
        let ring = (0..cycle_count)
            .map(|_| vec![RunningStats::new(); bucket_count])
            .collect();
        Self {
            bucket_count,
            cycle_count,
            ring,
            cycle: 0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn cycle_count(&self) -> usize {
        self.cycle_count
    }

    /// Current ring slot index (the one just reset and repopulated).
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Accumulate one window's bucket vector into the ring:
    /// reset the oldest slot, advance to it, then add `buckets` to every slot.
    pub fn accumulate(&mut self, buckets: &[f64]) {
        debug_assert_eq!(buckets.len(), self.bucket_count);

        for stat in &mut self.ring[self.cycle] {
            stat.clear();
        }
        self.cycle = (self.cycle + 1) % self.cycle_count;

        for slot in &mut self.ring {
            for (stat, &value) in slot.iter_mut().zip(buckets.iter()) {
                stat.add(value);
            }
        }
    }

    /// The freshest smoothed view: `ring[cycle]`.
    pub fn stats(&self) -> &[RunningStats] {
        &self.ring[self.cycle]
    }

    /// All ring slots, for testing the "sum of counts" invariant.
    pub fn slots(&self) -> &[Vec<RunningStats>] {
        &self.ring
    }
}
