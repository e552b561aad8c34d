//! Build statistics and self-checks.
//!
//! The `Cell stats:` line is scraped by downstream benchmark tooling, so its
//! wording and field order are fixed.

use std::fmt;

use log::{info, warn};
use serde::Serialize;

use crate::cell::Cell;
use crate::collective::Reduction;
use crate::error::BuildError;
use crate::params::ModelParameters;

/// Network-wide cell totals, known on the root rank only
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStats {
    pub num_cells: usize,
    pub segments: u64,
    pub compartments: u64,
}

impl CellStats {
    pub fn compartments_per_cell(&self) -> f64 {
        if self.num_cells == 0 {
            return 0.0;
        }
        self.compartments as f64 / self.num_cells as f64
    }
}

impl fmt::Display for CellStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell stats: {} cells; {} segments; {} compartments; {} comp/cell.",
            self.num_cells,
            self.segments,
            self.compartments,
            self.compartments_per_cell()
        )
    }
}

/// Per-worker counts of what was built against what the layout predicts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WiringReport {
    pub rank: usize,
    pub cells: usize,
    pub rings_created: usize,
    pub rings_expected: f64,
    pub synapses_created: usize,
    pub synapses_expected: f64,
}

impl WiringReport {
    /// Expected values follow the even-split approximation: they are exact
    /// only when the ranks divide the cells and the rings evenly.
    pub fn new(
        params: &ModelParameters,
        rank: usize,
        num_ranks: usize,
        cells: usize,
        rings_created: usize,
        synapses_created: usize,
    ) -> Self {
        let rings_expected = cells as f64 / params.ring_size as f64;
        let total = params.num_connections().unwrap_or(usize::MAX) as f64;
        Self {
            rank,
            cells,
            rings_created,
            rings_expected,
            synapses_created,
            synapses_expected: total / num_ranks as f64 + rings_expected,
        }
    }

    pub fn rings_match(&self) -> bool {
        self.rings_created as f64 == self.rings_expected
    }

    pub fn synapses_match(&self) -> bool {
        self.synapses_created as f64 == self.synapses_expected
    }

    /// Log the per-rank lines; mismatches are diagnostics only.
    pub fn log(&self) {
        info!("Number of cells on rank {}: {}.", self.rank, self.cells);
        info!(
            "Number of rings on rank {} (created/expected): {}/{}.",
            self.rank, self.rings_created, self.rings_expected
        );
        info!(
            "Number of synapses on rank {} (created/expected): {}/{}.",
            self.rank, self.synapses_created, self.synapses_expected
        );
        if !self.rings_match() {
            warn!(
                "Rank {} created {} rings, {} expected",
                self.rank, self.rings_created, self.rings_expected
            );
        }
        if !self.synapses_match() {
            warn!(
                "Rank {} created {} synapses, {} expected",
                self.rank, self.synapses_created, self.synapses_expected
            );
        }
    }
}

/// Sum this worker's compartment and segment counts over all workers.
///
/// Both values travel in a single reduction. The result, and the
/// `Cell stats:` log line, exist on the root rank only.
pub fn aggregate_cell_stats(
    cells: &[Box<dyn Cell>],
    num_cells: usize,
    reduction: &dyn Reduction,
) -> Result<Option<CellStats>, BuildError> {
    let compartments: u64 = cells.iter().map(|c| c.num_compartments() as u64).sum();
    let segments: u64 = cells.iter().map(|c| c.num_segments() as u64).sum();

    let totals = if reduction.num_ranks() > 1 {
        reduction.sum(&[compartments, segments])?
    } else {
        Some(vec![compartments, segments])
    };

    let stats = match totals.as_deref() {
        Some([compartments, segments]) => Some(CellStats {
            num_cells,
            segments: *segments,
            compartments: *compartments,
        }),
        Some(other) => {
            return Err(BuildError::Partition(format!(
                "reduction returned {} values, expected 2",
                other.len()
            )))
        }
        None => None,
    };

    if let Some(stats) = &stats {
        info!("{}", stats);
    }
    Ok(stats)
}
