//! Deterministic partitioning of an epoch's batches across workers.
//!
//! Partitioning is pure arithmetic over an explicit `(worker id, worker
//! count)` pair, so every worker computes its own disjoint slice without any
//! shared state or dynamic claiming.

use std::ops::Range;

use crate::error::{Result, SamplerError};

/// Identity of one worker within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSplit {
    id: usize,
    count: usize,
}

impl WorkerSplit {
    /// Create a worker identity; `id` must be below `count`.
    pub fn new(id: usize, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(SamplerError::config("worker count must be positive"));
        }
        if id >= count {
            return Err(SamplerError::config(format!(
                "worker id {id} out of range for {count} workers"
            )));
        }
        Ok(Self { id, count })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Compute one worker's contiguous slice of the batch indices
/// `[0, total_batches)`.
///
/// Every worker gets `total_batches / count` batches; the last worker also
/// absorbs the remainder. With no worker context the full range is
/// returned. Across all workers of a pool the ranges are disjoint and cover
/// the full range exactly.
pub fn worker_range(total_batches: usize, split: Option<WorkerSplit>) -> Range<usize> {
    match split {
        None => 0..total_batches,
        Some(worker) => {
            let per_worker = total_batches / worker.count;
            let start = worker.id * per_worker;
            let end = if worker.id + 1 == worker.count {
                total_batches
            } else {
                start + per_worker
            };
            start..end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(total: usize, count: usize) {
        let mut covered = vec![0usize; total];
        for id in 0..count {
            let split = WorkerSplit::new(id, count).unwrap();
            for bidx in worker_range(total, Some(split)) {
                covered[bidx] += 1;
            }
        }
        assert!(
            covered.iter().all(|&c| c == 1),
            "partition of {total} over {count} workers is not exact: {covered:?}"
        );
    }

    #[test]
    fn test_exact_cover_even_division() {
        assert_exact_cover(12, 4);
        assert_exact_cover(100, 10);
    }

    #[test]
    fn test_exact_cover_with_remainder() {
        assert_exact_cover(13, 4);
        assert_exact_cover(7, 3);
        assert_exact_cover(101, 10);
    }

    #[test]
    fn test_exact_cover_degenerate_pools() {
        assert_exact_cover(5, 1);
        assert_exact_cover(5, 5);
        // More workers than batches: early workers get empty ranges, the
        // last worker takes everything.
        assert_exact_cover(3, 8);
        assert_exact_cover(0, 4);
    }

    #[test]
    fn test_last_worker_absorbs_remainder() {
        let last = WorkerSplit::new(3, 4).unwrap();
        assert_eq!(worker_range(13, Some(last)), 9..13);
    }

    #[test]
    fn test_no_split_means_full_range() {
        assert_eq!(worker_range(9, None), 0..9);
    }

    #[test]
    fn test_invalid_split_rejected() {
        assert!(WorkerSplit::new(0, 0).is_err());
        assert!(WorkerSplit::new(4, 4).is_err());
        assert!(WorkerSplit::new(2, 4).is_ok());
    }
}
