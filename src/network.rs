//! Ring network construction for one worker.
//!
//! [`RingNetwork::build`] runs a single pass over the worker's gids:
//! partition, instantiate cells, register them, wire rings and load
//! connections, then report statistics. Any error aborts the whole build.
//! The resulting network owns its cells, connections and stimuli until it
//! is dropped.

use log::{debug, info};

use crate::cell::{Cell, CellFactory};
use crate::collective::Reduction;
use crate::error::BuildError;
use crate::params::ModelParameters;
use crate::registry::DistributedRegistry;
use crate::stats::{aggregate_cell_stats, CellStats, WiringReport};
use crate::topology::{owned_gids, Connection, RandomSynapseGenerator, RingWiring, Stimulus};
use crate::Gid;

/// Construction stages, in order.
///
/// Registration comes before wiring: the registry only accepts connections
/// whose target is a registered local gid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    Uninitialized,
    PartitionComputed,
    CellsInstantiated,
    Registered,
    Wired,
    StatsReported,
    Ready,
}

#[derive(Debug)]
pub struct RingNetwork {
    rank: usize,
    num_ranks: usize,
    gids: Vec<Gid>,
    cells: Vec<Box<dyn Cell>>,
    connections: Vec<Connection>,
    stimuli: Vec<Stimulus>,
    cell_stats: Option<CellStats>,
    report: WiringReport,
    stage: BuildStage,
}

struct Builder {
    stage: BuildStage,
}

impl Builder {
    fn advance(&mut self, next: BuildStage) {
        debug_assert!(next > self.stage);
        debug!("Ring network stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

impl RingNetwork {
    /// Build the part of the network owned by `reduction.rank()`.
    pub fn build(
        params: &ModelParameters,
        factory: &dyn CellFactory,
        registry: &mut dyn DistributedRegistry,
        reduction: &dyn Reduction,
    ) -> Result<Self, BuildError> {
        params
            .validate()
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        let rank = reduction.rank();
        let num_ranks = reduction.num_ranks();
        info!("Initializing ring on rank_id={} (num_ranks={}).", rank, num_ranks);

        let mut builder = Builder {
            stage: BuildStage::Uninitialized,
        };

        let gids = owned_gids(params.num_cells, num_ranks, rank)?;
        builder.advance(BuildStage::PartitionComputed);

        let mut cells = Vec::with_capacity(gids.len());
        for &gid in &gids {
            let cell = factory.create(gid, &params.cell)?;
            if cell.num_synapses() != params.cell.synapses + 1 {
                return Err(BuildError::Cell {
                    gid,
                    reason: format!(
                        "cell exposes {} synapse slots, {} required",
                        cell.num_synapses(),
                        params.cell.synapses + 1
                    ),
                });
            }
            cells.push(cell);
        }
        builder.advance(BuildStage::CellsInstantiated);

        for &gid in &gids {
            registry.register(gid, rank)?;
        }
        builder.advance(BuildStage::Registered);

        let ring_wiring = RingWiring::new(params);
        let load_wiring = RandomSynapseGenerator::new(params);

        let per_cell = params.cell.synapses + 1;
        let mut connections = Vec::with_capacity(gids.len() * per_cell);
        let mut stimuli = Vec::new();
        for &gid in &gids {
            let (ring_connection, stimulus) = ring_wiring.wire(gid, registry)?;
            connections.push(ring_connection);
            stimuli.extend(stimulus);
            connections.extend(load_wiring.wire(gid, registry)?);
        }
        builder.advance(BuildStage::Wired);

        let cell_stats = aggregate_cell_stats(&cells, params.num_cells, reduction)?;
        let report = WiringReport::new(
            params,
            rank,
            num_ranks,
            gids.len(),
            stimuli.len(),
            connections.len() + stimuli.len(),
        );
        report.log();
        builder.advance(BuildStage::StatsReported);

        builder.advance(BuildStage::Ready);

        Ok(Self {
            rank,
            num_ranks,
            gids,
            cells,
            connections,
            stimuli,
            cell_stats,
            report,
            stage: builder.stage,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    pub fn gids(&self) -> &[Gid] {
        &self.gids
    }

    pub fn cells(&self) -> &[Box<dyn Cell>] {
        &self.cells
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    /// Network-wide totals; `Some` on the root rank only
    pub fn cell_stats(&self) -> Option<&CellStats> {
        self.cell_stats.as_ref()
    }

    pub fn report(&self) -> &WiringReport {
        &self.report
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Connections targeting `gid`, in slot order
    pub fn incoming(&self, gid: Gid) -> Vec<&Connection> {
        let mut incoming: Vec<&Connection> =
            self.connections.iter().filter(|c| c.target == gid).collect();
        incoming.sort_by_key(|c| c.slot);
        incoming
    }
}
