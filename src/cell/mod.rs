//! Cell construction.
//!
//! The topology generator only needs three facts about a cell: how many
//! compartments and segments it has (for the statistics report) and how many
//! synapse slots it exposes. Everything else about the cell model is up to
//! the factory.

pub mod branchy;

pub use branchy::{BranchyCell, BranchyCellFactory};

use crate::error::BuildError;
use crate::params::CellParameters;
use crate::Gid;

/// A constructed cell as seen by the network builder
pub trait Cell: std::fmt::Debug + Send {
    fn gid(&self) -> Gid;
    fn num_compartments(&self) -> usize;
    fn num_segments(&self) -> usize;
    /// Addressable synapse slots, indexed from 0
    fn num_synapses(&self) -> usize;
}

/// Builds the cell for a gid. Must expose `params.synapses + 1` slots.
pub trait CellFactory: Sync {
    fn create(&self, gid: Gid, params: &CellParameters) -> Result<Box<dyn Cell>, BuildError>;
}
