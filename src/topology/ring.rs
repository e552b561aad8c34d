//! Ring wiring.
//!
//! Gids are grouped into contiguous bands of `ring_size` cells. Each cell
//! receives one connection from its predecessor in the band, and the first
//! cell of a band closes the cycle by listening to the last one. The final
//! band is shorter when `num_cells` is not a multiple of `ring_size` and
//! wraps inside its own bounds.

use crate::error::BuildError;
use crate::params::ModelParameters;
use crate::registry::DistributedRegistry;
use crate::topology::types::{Connection, ConnectionKind, Stimulus};
use crate::Gid;

/// Half-open gid range `[start, end)` forming one ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    pub index: usize,
    pub start: Gid,
    pub end: Gid,
}

impl Ring {
    /// Ring that contains `gid`.
    pub fn containing(gid: Gid, ring_size: usize, num_cells: usize) -> Result<Self, BuildError> {
        if ring_size == 0 {
            return Err(BuildError::Configuration(
                "ring size must be at least 1".to_string(),
            ));
        }
        if gid >= num_cells {
            return Err(BuildError::Partition(format!(
                "gid {} is outside the network of {} cells",
                gid, num_cells
            )));
        }
        let index = gid / ring_size;
        let start = ring_size * index;
        let end = (start + ring_size).min(num_cells);
        Ok(Self { index, start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Cell feeding `gid`; the first cell wraps around to the last.
    pub fn predecessor(&self, gid: Gid) -> Gid {
        if gid == self.start {
            self.end - 1
        } else {
            gid - 1
        }
    }
}

/// Wiring decided for one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingPlan {
    pub ring: Ring,
    pub predecessor: Gid,
    pub starts_ring: bool,
}

/// Builds the ring connection and startup stimulus for owned cells.
#[derive(Debug, Clone)]
pub struct RingWiring {
    ring_size: usize,
    num_cells: usize,
    min_delay: f64,
    event_weight: f64,
}

impl RingWiring {
    pub fn new(params: &ModelParameters) -> Self {
        Self {
            ring_size: params.ring_size,
            num_cells: params.num_cells,
            min_delay: params.min_delay,
            event_weight: params.event_weight,
        }
    }

    pub fn plan(&self, gid: Gid) -> Result<RingPlan, BuildError> {
        let ring = Ring::containing(gid, self.ring_size, self.num_cells)?;
        Ok(RingPlan {
            ring,
            predecessor: ring.predecessor(gid),
            starts_ring: gid == ring.start,
        })
    }

    /// Connect `gid` to its predecessor on slot 0 and, if `gid` starts its
    /// ring, attach a stimulus to the same slot.
    pub fn wire(
        &self,
        gid: Gid,
        registry: &mut dyn DistributedRegistry,
    ) -> Result<(Connection, Option<Stimulus>), BuildError> {
        let plan = self.plan(gid)?;

        let mut connection = registry.connect(plan.predecessor, gid, 0)?;
        connection.kind = ConnectionKind::Ring;
        connection.delay = self.min_delay;
        connection.weight = self.event_weight;

        let stimulus = plan
            .starts_ring
            .then(|| Stimulus::new(gid, self.event_weight));

        Ok((connection, stimulus))
    }
}
