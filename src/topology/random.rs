//! Random zero-weight load connections.
//!
//! Every cell receives `synapses` extra connections on slots
//! `1..=synapses`. Sources and delays are drawn from generators seeded with
//! the target gid alone, so the generated graph is the same whatever the
//! number of workers or the order in which cells are built.
//!
//! Source and delay streams start from the same seed. The delay stream is a
//! clone of the source stream, which makes the two sequences correlated; the
//! benchmark graphs depend on this, so it must not be "fixed".

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::BuildError;
use crate::params::ModelParameters;
use crate::registry::DistributedRegistry;
use crate::topology::types::{Connection, ConnectionKind};
use crate::Gid;

/// Source gid and delay of one load connection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSynapse {
    pub slot: usize,
    pub source: Gid,
    pub delay: f64,
}

#[derive(Debug, Clone)]
pub struct RandomSynapseGenerator {
    num_cells: usize,
    synapses: usize,
    min_delay: f64,
}

impl RandomSynapseGenerator {
    pub fn new(params: &ModelParameters) -> Self {
        Self {
            num_cells: params.num_cells,
            synapses: params.cell.synapses,
            min_delay: params.min_delay,
        }
    }

    /// Draw the load synapses of `gid`.
    pub fn plan(&self, gid: Gid) -> Result<Vec<LoadSynapse>, BuildError> {
        if self.synapses == 0 {
            return Ok(Vec::new());
        }
        if self.num_cells < 3 {
            return Err(BuildError::Configuration(format!(
                "random synapses need at least 3 cells, got {}",
                self.num_cells
            )));
        }
        if !(self.min_delay.is_finite() && self.min_delay > 0.0) {
            return Err(BuildError::Configuration(format!(
                "min delay must be positive, got {}",
                self.min_delay
            )));
        }

        let mut source_rng = ChaCha8Rng::seed_from_u64(gid as u64);
        let mut delay_rng = source_rng.clone();

        let planned = (1..=self.synapses)
            .map(|slot| {
                let mut source = source_rng.gen_range(0..(self.num_cells - 2) as u64) as Gid;
                // Collision step is not re-checked against the range.
                if source == gid {
                    source += 1;
                }
                let delay = self.min_delay + delay_rng.gen_range(0.0..2.0 * self.min_delay);
                LoadSynapse { slot, source, delay }
            })
            .collect();
        Ok(planned)
    }

    /// Create the load connections of `gid` through `registry`.
    pub fn wire(
        &self,
        gid: Gid,
        registry: &mut dyn DistributedRegistry,
    ) -> Result<Vec<Connection>, BuildError> {
        self.plan(gid)?
            .into_iter()
            .map(|synapse| {
                let mut connection = registry.connect(synapse.source, gid, synapse.slot)?;
                connection.kind = ConnectionKind::Load;
                connection.weight = 0.0;
                connection.delay = synapse.delay;
                Ok(connection)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CellParameters;

    fn params(num_cells: usize, synapses: usize, min_delay: f64) -> ModelParameters {
        let mut params = ModelParameters::new(100.0, 1, 4, CellParameters::new([1.0, 0.5], [1, 1], synapses));
        params.num_cells = num_cells;
        params.min_delay = min_delay;
        params
    }

    #[test]
    fn test_slots_count_and_delay_range() {
        let generator = RandomSynapseGenerator::new(&params(40, 2, 10.0));
        for gid in 0..40 {
            let planned = generator.plan(gid).unwrap();
            assert_eq!(planned.len(), 2);
            assert_eq!(planned.iter().map(|s| s.slot).collect::<Vec<_>>(), vec![1, 2]);
            for synapse in planned {
                assert!(synapse.delay >= 10.0 && synapse.delay < 30.0, "delay {}", synapse.delay);
                assert!(synapse.source < 40 - 1);
            }
        }
    }

    #[test]
    fn test_plan_depends_only_on_gid() {
        let generator = RandomSynapseGenerator::new(&params(1000, 10, 5.0));
        let forward: Vec<_> = (0..1000).map(|gid| generator.plan(gid).unwrap()).collect();
        let backward: Vec<_> = (0..1000).rev().map(|gid| generator.plan(gid).unwrap()).collect();
        for (gid, planned) in forward.iter().enumerate() {
            assert_eq!(planned, &backward[999 - gid]);
        }
    }

    #[test]
    fn test_self_source_is_shifted() {
        let generator = RandomSynapseGenerator::new(&params(5, 50, 1.0));
        // Sources come from [0, 3); a cell in that range never lists itself
        for gid in 0..3 {
            for synapse in generator.plan(gid).unwrap() {
                assert_ne!(synapse.source, gid);
            }
        }
    }

    #[test]
    fn test_collision_adds_exactly_one() {
        let num_cells = 5;
        let synapses = 50;
        let generator = RandomSynapseGenerator::new(&params(num_cells, synapses, 1.0));
        let mut collisions = 0;
        for gid in 0..num_cells - 2 {
            let mut replay = ChaCha8Rng::seed_from_u64(gid as u64);
            let planned = generator.plan(gid).unwrap();
            for synapse in planned {
                let raw = replay.gen_range(0..(num_cells - 2) as u64) as Gid;
                if raw == gid {
                    collisions += 1;
                    assert_eq!(synapse.source, gid + 1, "gid {} slot {}", gid, synapse.slot);
                } else {
                    assert_eq!(synapse.source, raw, "gid {} slot {}", gid, synapse.slot);
                }
            }
        }
        assert!(collisions > 0);
    }

    #[test]
    fn test_collision_on_last_drawable_gid_leaves_draw_range() {
        // gid 2 is the largest value drawn from [0, 3); its shifted source is 3
        let generator = RandomSynapseGenerator::new(&params(5, 50, 1.0));
        let sources: Vec<Gid> = generator.plan(2).unwrap().iter().map(|s| s.source).collect();
        assert!(sources.contains(&3));
        assert!(!sources.contains(&2));
    }

    #[test]
    fn test_streams_share_a_seed() {
        let generator = RandomSynapseGenerator::new(&params(100, 1, 10.0));
        let gid = 42;
        let mut probe = ChaCha8Rng::seed_from_u64(gid as u64);
        let mut expected_source = probe.clone().gen_range(0..98u64) as Gid;
        if expected_source == gid {
            expected_source += 1;
        }
        let expected_delay = 10.0 + probe.gen_range(0.0..20.0);

        let planned = generator.plan(gid).unwrap();
        assert_eq!(planned[0].source, expected_source);
        assert_eq!(planned[0].delay, expected_delay);
    }

    #[test]
    fn test_too_few_cells() {
        let generator = RandomSynapseGenerator::new(&params(2, 1, 10.0));
        assert!(matches!(generator.plan(0), Err(BuildError::Configuration(_))));
        let generator = RandomSynapseGenerator::new(&params(2, 0, 10.0));
        assert!(generator.plan(0).unwrap().is_empty());
    }
}
