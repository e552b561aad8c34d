//! Error types for network construction.
//!
//! Every variant is fatal: a benchmark run with an inconsistent topology is
//! useless, so construction aborts on the first error. Count mismatches found
//! while reporting statistics are logged instead and never show up here.

use crate::Gid;

/// Errors raised while building a ring network.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Inconsistent partition request: {0}")]
    Partition(String),
    #[error("Registry rejected request: {0}")]
    Registry(#[from] RegistryError),
    #[error("Cell factory failed for gid {gid}: {reason}")]
    Cell { gid: Gid, reason: String },
    #[error("Collective aborted: {0}")]
    Aborted(String),
    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors raised by a [`crate::registry::DistributedRegistry`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("gid {gid} is already registered to worker {owner}")]
    AlreadyRegistered { gid: Gid, owner: usize },
    #[error("gid {gid} is outside the network (num_cells = {num_cells})")]
    UnknownGid { gid: Gid, num_cells: usize },
    #[error("target gid {0} is not registered on this worker")]
    NotLocal(Gid),
    #[error("slot {slot} out of range for gid {gid} ({num_slots} slots)")]
    SlotOutOfRange { gid: Gid, slot: usize, num_slots: usize },
}
