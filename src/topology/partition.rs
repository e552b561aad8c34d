//! Round-robin distribution of gids over workers.
//!
//! Ownership is a pure function of `(gid, num_ranks)`, so every worker can
//! compute its share without talking to the others.

use crate::error::BuildError;
use crate::Gid;

/// Worker that owns `gid` when `num_ranks` workers participate.
pub fn owner_of(gid: Gid, num_ranks: usize) -> Result<usize, BuildError> {
    if num_ranks < 1 {
        return Err(BuildError::Configuration(
            "number of ranks must be at least 1".to_string(),
        ));
    }
    Ok(gid % num_ranks)
}

/// Gids owned by `rank`, in increasing order: `rank, rank + num_ranks, ...`
/// up to but excluding `num_cells`.
///
/// # Examples
/// ```
/// use busyring::topology::owned_gids;
///
/// assert_eq!(owned_gids(10, 4, 1).unwrap(), vec![1, 5, 9]);
/// assert!(owned_gids(10, 0, 0).is_err());
/// ```
pub fn owned_gids(num_cells: usize, num_ranks: usize, rank: usize) -> Result<Vec<Gid>, BuildError> {
    if num_ranks < 1 {
        return Err(BuildError::Configuration(
            "number of ranks must be at least 1".to_string(),
        ));
    }
    if rank >= num_ranks {
        return Err(BuildError::Partition(format!(
            "rank {} is out of range for {} ranks",
            rank, num_ranks
        )));
    }
    Ok((rank..num_cells).step_by(num_ranks).collect())
}
