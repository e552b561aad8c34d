//! Randomly branching cell morphology.
//!
//! A soma carries a single dendrite root. At each level a branch splits into
//! two children with a probability interpolated linearly between
//! `branch_probs[0]` (root) and `branch_probs[1]` (deepest level); the
//! compartment count per branch is interpolated the same way. The tree stops
//! at `max_depth`. Branching draws come from a gid-seeded generator on its own
//! stream, separate from the one used for load connections.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Cell, CellFactory};
use crate::error::BuildError;
use crate::params::CellParameters;
use crate::Gid;

const MORPHOLOGY_STREAM: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchyCell {
    gid: Gid,
    /// Sections including the soma
    segments: usize,
    compartments: usize,
    synapses: usize,
}

impl Cell for BranchyCell {
    fn gid(&self) -> Gid {
        self.gid
    }

    fn num_compartments(&self) -> usize {
        self.compartments
    }

    fn num_segments(&self) -> usize {
        self.segments
    }

    fn num_synapses(&self) -> usize {
        self.synapses
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchyCellFactory;

fn interpolate(range: [f64; 2], level: u32, max_depth: u32) -> f64 {
    if max_depth == 0 {
        return range[0];
    }
    range[0] + (range[1] - range[0]) * level as f64 / max_depth as f64
}

impl BranchyCellFactory {
    pub fn build(&self, gid: Gid, params: &CellParameters) -> Result<BranchyCell, BuildError> {
        if params.compartments.contains(&0) {
            return Err(BuildError::Cell {
                gid,
                reason: format!("compartment range {:?} contains 0", params.compartments),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(gid as u64);
        rng.set_stream(MORPHOLOGY_STREAM);

        let compartment_range = [params.compartments[0] as f64, params.compartments[1] as f64];

        // soma
        let mut segments = 1;
        let mut compartments = 1;

        let mut branches_at_level = 1usize;
        for level in 0..=params.max_depth {
            if branches_at_level == 0 {
                break;
            }
            let per_branch = interpolate(compartment_range, level, params.max_depth).round() as usize;
            segments += branches_at_level;
            compartments += branches_at_level * per_branch.max(1);

            if level == params.max_depth {
                break;
            }
            let p_branch = interpolate(params.branch_probs, level, params.max_depth).clamp(0.0, 1.0);
            let splitting = (0..branches_at_level)
                .filter(|_| rng.gen_bool(p_branch))
                .count();
            branches_at_level = 2 * splitting;
        }

        Ok(BranchyCell {
            gid,
            segments,
            compartments,
            synapses: params.synapses + 1,
        })
    }
}

impl CellFactory for BranchyCellFactory {
    fn create(&self, gid: Gid, params: &CellParameters) -> Result<Box<dyn Cell>, BuildError> {
        Ok(Box::new(self.build(gid, params)?))
    }
}
