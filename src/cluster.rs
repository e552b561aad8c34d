//! In-process cluster runner.
//!
//! Each rank runs on its own thread of a dedicated rayon pool sized to the
//! number of ranks, so every worker is live at the same time and the
//! statistics barrier can complete. Every rank gets a private registry and
//! builds its share of the network independently.

use log::{error, info};
use rayon::ThreadPoolBuilder;

use crate::cell::CellFactory;
use crate::collective::{Reduction, SharedMemoryCollective, SoloReduction, ROOT_RANK};
use crate::error::BuildError;
use crate::network::RingNetwork;
use crate::params::ModelParameters;
use crate::registry::LocalRegistry;
use crate::stats::CellStats;
use crate::topology::{Connection, Stimulus};

/// Networks built by every rank, indexed by rank
#[derive(Debug)]
pub struct ClusterRun {
    networks: Vec<RingNetwork>,
}

impl ClusterRun {
    pub fn num_ranks(&self) -> usize {
        self.networks.len()
    }

    pub fn networks(&self) -> &[RingNetwork] {
        &self.networks
    }

    pub fn rank(&self, rank: usize) -> Option<&RingNetwork> {
        self.networks.get(rank)
    }

    /// Totals reported on the root rank
    pub fn cell_stats(&self) -> Option<&CellStats> {
        self.networks.get(ROOT_RANK).and_then(RingNetwork::cell_stats)
    }

    /// Every connection of every rank, ordered by target gid then slot
    pub fn connections(&self) -> Vec<&Connection> {
        let mut all: Vec<&Connection> = self
            .networks
            .iter()
            .flat_map(|network| network.connections())
            .collect();
        all.sort_by_key(|c| (c.target, c.slot));
        all
    }

    /// Every stimulus of every rank, ordered by target gid
    pub fn stimuli(&self) -> Vec<&Stimulus> {
        let mut all: Vec<&Stimulus> = self
            .networks
            .iter()
            .flat_map(|network| network.stimuli())
            .collect();
        all.sort_by_key(|s| s.target);
        all
    }
}

fn build_rank(
    params: &ModelParameters,
    factory: &dyn CellFactory,
    reduction: &dyn Reduction,
) -> Result<RingNetwork, BuildError> {
    let mut registry = LocalRegistry::new(reduction.rank(), params.num_cells, params.cell.synapses + 1);
    RingNetwork::build(params, factory, &mut registry, reduction).inspect_err(|e| {
        error!("Rank {} failed: {}", reduction.rank(), e);
        reduction.abort();
    })
}

/// Build the network with `num_ranks` workers.
///
/// A rank that fails aborts the statistics reduction so the others return
/// instead of waiting on it. The error reported is the one that caused the
/// abort, not the ones it triggered on the other ranks.
pub fn run_cluster(
    params: &ModelParameters,
    num_ranks: usize,
    factory: &dyn CellFactory,
) -> Result<ClusterRun, BuildError> {
    params
        .validate()
        .map_err(|e| BuildError::Configuration(e.to_string()))?;

    if num_ranks == 1 {
        let network = build_rank(params, factory, &SoloReduction)?;
        return Ok(ClusterRun {
            networks: vec![network],
        });
    }

    let collective = SharedMemoryCollective::new(num_ranks)?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_ranks)
        .thread_name(|index| format!("rank-{}", index))
        .build()?;

    info!("Building ring network on {} in-process ranks", num_ranks);
    let results = pool.broadcast(|ctx| {
        let endpoint = collective.endpoint(ctx.index())?;
        build_rank(params, factory, &endpoint)
    });

    let mut networks = Vec::with_capacity(num_ranks);
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(network) => networks.push(network),
            Err(e) => errors.push(e),
        }
    }
    if let Some(pos) = errors
        .iter()
        .position(|e| !matches!(e, BuildError::Aborted(_)))
    {
        return Err(errors.swap_remove(pos));
    }
    match errors.pop() {
        Some(e) => Err(e),
        None => Ok(ClusterRun { networks }),
    }
}
