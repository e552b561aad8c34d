//! Collective sum reduction across workers.
//!
//! Workers never talk to each other while wiring. The statistics report is
//! the single exception: every worker submits its local counts and rank 0
//! receives the element-wise sum. The call blocks with no timeout: a worker
//! that hangs stalls all the others, while a worker that fails aborts the
//! collective and releases them.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::error::BuildError;

/// Rank that receives reduction results
pub const ROOT_RANK: usize = 0;

/// One worker's view of the collective.
pub trait Reduction {
    fn rank(&self) -> usize;
    fn num_ranks(&self) -> usize;

    /// Element-wise sum of `local` over all workers. Returns `Some` on the
    /// root rank and `None` elsewhere. Every worker must call it with a slice
    /// of the same length.
    fn sum(&self, local: &[u64]) -> Result<Option<Vec<u64>>, BuildError>;

    /// Signal that this worker failed and will not take part in further
    /// reductions. Workers waiting in, or later entering, [`Reduction::sum`]
    /// get an error instead of blocking forever.
    fn abort(&self) {}
}

/// Reduction for a run with a single worker
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloReduction;

impl Reduction for SoloReduction {
    fn rank(&self) -> usize {
        ROOT_RANK
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn sum(&self, local: &[u64]) -> Result<Option<Vec<u64>>, BuildError> {
        Ok(Some(local.to_vec()))
    }
}

#[derive(Debug)]
struct SharedState {
    num_ranks: usize,
    round: Mutex<Round>,
    completed: Condvar,
}

#[derive(Debug, Default)]
struct Round {
    totals: Vec<u64>,
    contributions: usize,
    length_mismatch: bool,
    /// Bumped each time a round completes
    generation: u64,
    /// Outcome of the last completed round
    published: Vec<u64>,
    published_mismatch: bool,
    aborted: Option<usize>,
}

impl Round {
    fn abort_error(rank: usize) -> BuildError {
        BuildError::Aborted(format!("rank {} failed before the statistics reduction", rank))
    }
}

/// Reduction for workers running as threads of one process.
///
/// Arrival is tracked under a mutex and waiters sleep on a condition
/// variable, so a failed worker can [`Reduction::abort`] the collective and
/// release everyone still waiting.
#[derive(Debug, Clone)]
pub struct SharedMemoryCollective {
    state: Arc<SharedState>,
}

impl SharedMemoryCollective {
    pub fn new(num_ranks: usize) -> Result<Self, BuildError> {
        if num_ranks < 1 {
            return Err(BuildError::Configuration(
                "number of ranks must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            state: Arc::new(SharedState {
                num_ranks,
                round: Mutex::new(Round::default()),
                completed: Condvar::new(),
            }),
        })
    }

    /// Handle for `rank`. Each rank must take exactly one.
    pub fn endpoint(&self, rank: usize) -> Result<CollectiveEndpoint, BuildError> {
        if rank >= self.state.num_ranks {
            return Err(BuildError::Partition(format!(
                "rank {} is out of range for {} ranks",
                rank, self.state.num_ranks
            )));
        }
        Ok(CollectiveEndpoint {
            rank,
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CollectiveEndpoint {
    rank: usize,
    state: Arc<SharedState>,
}

impl CollectiveEndpoint {
    fn lock(&self) -> MutexGuard<'_, Round> {
        self.state
            .round
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn outcome(&self, round: &Round) -> Result<Option<Vec<u64>>, BuildError> {
        if round.published_mismatch {
            return Err(BuildError::Partition(
                "workers submitted reductions of different lengths".to_string(),
            ));
        }
        Ok((self.rank == ROOT_RANK).then(|| round.published.clone()))
    }
}

impl Reduction for CollectiveEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.state.num_ranks
    }

    fn sum(&self, local: &[u64]) -> Result<Option<Vec<u64>>, BuildError> {
        let mut round = self.lock();
        if let Some(failed) = round.aborted {
            return Err(Round::abort_error(failed));
        }

        if round.contributions == 0 {
            round.totals = vec![0; local.len()];
        }
        if round.totals.len() != local.len() {
            round.length_mismatch = true;
        } else {
            for (total, value) in round.totals.iter_mut().zip(local) {
                *total += value;
            }
        }
        round.contributions += 1;

        if round.contributions == self.state.num_ranks {
            round.published = std::mem::take(&mut round.totals);
            round.published_mismatch = std::mem::take(&mut round.length_mismatch);
            round.contributions = 0;
            round.generation += 1;
            self.state.completed.notify_all();
            return self.outcome(&round);
        }

        // The published outcome stays valid until this rank contributes again
        let generation = round.generation;
        let round = self
            .state
            .completed
            .wait_while(round, |r| r.generation == generation && r.aborted.is_none())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if round.generation == generation {
            if let Some(failed) = round.aborted {
                return Err(Round::abort_error(failed));
            }
        }
        self.outcome(&round)
    }

    fn abort(&self) {
        let mut round = self.lock();
        round.aborted.get_or_insert(self.rank);
        self.state.completed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_solo_reduction_returns_input() {
        let solo = SoloReduction;
        assert_eq!(solo.sum(&[3, 4]).unwrap(), Some(vec![3, 4]));
        assert_eq!(solo.num_ranks(), 1);
    }

    #[test]
    fn test_shared_memory_sum_reaches_root_only() {
        let collective = SharedMemoryCollective::new(4).unwrap();
        let results: Vec<(usize, Option<Vec<u64>>)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|rank| {
                    let endpoint = collective.endpoint(rank).unwrap();
                    scope.spawn(move || {
                        let first = endpoint.sum(&[rank as u64, 1]).unwrap();
                        let second = endpoint.sum(&[10]).unwrap();
                        (rank, first.map(|mut v| {
                            v.extend(second.unwrap_or_default());
                            v
                        }))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (rank, outcome) in results {
            if rank == ROOT_RANK {
                assert_eq!(outcome, Some(vec![6, 4, 40]));
            } else {
                assert_eq!(outcome, None);
            }
        }
    }

    #[test]
    fn test_abort_releases_waiting_ranks() {
        let collective = SharedMemoryCollective::new(3).unwrap();
        let outcomes: Vec<Result<Option<Vec<u64>>, BuildError>> = thread::scope(|scope| {
            let waiters: Vec<_> = (0..2)
                .map(|rank| {
                    let endpoint = collective.endpoint(rank).unwrap();
                    scope.spawn(move || endpoint.sum(&[1]))
                })
                .collect();
            collective.endpoint(2).unwrap().abort();
            waiters.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for outcome in outcomes {
            assert!(matches!(outcome, Err(BuildError::Aborted(_))));
        }
    }

    #[test]
    fn test_sum_after_abort_fails_immediately() {
        let collective = SharedMemoryCollective::new(2).unwrap();
        collective.endpoint(1).unwrap().abort();
        let result = collective.endpoint(0).unwrap().sum(&[5]);
        assert!(matches!(result, Err(BuildError::Aborted(msg)) if msg.contains("rank 1")));
    }

    #[test]
    fn test_length_mismatch_reported_on_every_rank() {
        let collective = SharedMemoryCollective::new(2).unwrap();
        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|rank| {
                    let endpoint = collective.endpoint(rank).unwrap();
                    scope.spawn(move || endpoint.sum(&vec![1; rank + 1]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for outcome in outcomes {
            assert!(matches!(outcome, Err(BuildError::Partition(_))));
        }
    }

    #[test]
    fn test_endpoint_out_of_range() {
        let collective = SharedMemoryCollective::new(2).unwrap();
        assert!(collective.endpoint(2).is_err());
        assert!(SharedMemoryCollective::new(0).is_err());
    }
}
