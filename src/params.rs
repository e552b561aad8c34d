use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape parameters handed to the cell factory.
#[derive(Debug, Clone, PartialEq)]
pub struct CellParameters {
    /// Maximum branching depth of the dendritic tree
    pub max_depth: u32,
    /// Branching probability at the soma and at the deepest level
    pub branch_probs: [f64; 2],
    /// Compartments per branch at the soma and at the deepest level
    pub compartments: [u32; 2],
    /// Branch length at the soma and at the deepest level
    pub lengths: [f64; 2],
    /// Number of zero-weight load synapses per cell
    pub synapses: usize,
    /// Requested complex cell type. Only the branchy cell exists, so this is
    /// carried through for reporting only.
    pub complex: bool,
}

impl CellParameters {
    pub fn new(branch_probs: [f64; 2], compartments: [u32; 2], synapses: usize) -> Self {
        Self {
            max_depth: 5,
            branch_probs,
            compartments,
            lengths: [200.0, 20.0],
            synapses,
            complex: false,
        }
    }
}

impl fmt::Display for CellParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cell parameters")?;
        writeln!(f, "  depth        :  {:10}", self.max_depth)?;
        writeln!(
            f,
            "  branch prob  :  [{:5.2} : {:5.2}]",
            self.branch_probs[0], self.branch_probs[1]
        )?;
        writeln!(
            f,
            "  compartments :  [{:5} : {:5}]",
            self.compartments[0], self.compartments[1]
        )?;
        writeln!(
            f,
            "  lengths      :  [{:5.1} : {:5.1}]",
            self.lengths[0], self.lengths[1]
        )?;
        writeln!(f, "  connections  :  {:5}", self.synapses)
    }
}

/// Model parameters for one benchmark run. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    pub name: String,
    /// Simulated duration in ms
    pub duration: f64,
    /// Integration step in ms, consumed by the simulation engine
    pub dt: f64,
    pub num_cells: usize,
    pub ring_size: usize,
    /// Minimum connection delay in ms
    pub min_delay: f64,
    /// Weight of ring connections and stimuli
    pub event_weight: f64,
    pub cell: CellParameters,
}

impl ModelParameters {
    /// Build parameters from command-line style inputs, using the stock
    /// defaults for everything not supplied.
    pub fn new(
        duration: f64,
        num_rings: usize,
        num_ring_cells: usize,
        cell: CellParameters,
    ) -> Self {
        Self {
            name: "default".to_string(),
            duration,
            dt: 0.025,
            num_cells: num_rings * num_ring_cells,
            ring_size: num_ring_cells,
            min_delay: 10.0,
            event_weight: 0.01,
            cell,
        }
    }

    /// Take every value from a parameter file. Command-line values are not
    /// consulted once a file is supplied.
    pub fn from_file(file: &ParameterFile) -> Self {
        Self {
            name: file.name.clone(),
            duration: file.duration,
            dt: file.dt,
            num_cells: file.num_cells,
            ring_size: file.ring_size,
            min_delay: file.min_delay,
            event_weight: file.event_weight,
            cell: CellParameters {
                max_depth: file.depth,
                branch_probs: file.branch_probs,
                compartments: file.compartments,
                lengths: file.lengths,
                synapses: file.synapses,
                complex: file.complex,
            },
        }
    }

    /// Inverse of [`ModelParameters::from_file`].
    pub fn to_file(&self) -> ParameterFile {
        ParameterFile {
            name: self.name.clone(),
            duration: self.duration,
            dt: self.dt,
            num_cells: self.num_cells,
            ring_size: self.ring_size,
            min_delay: self.min_delay,
            event_weight: self.event_weight,
            depth: self.cell.max_depth,
            branch_probs: self.cell.branch_probs,
            compartments: self.cell.compartments,
            lengths: self.cell.lengths,
            synapses: self.cell.synapses,
            complex: self.cell.complex,
        }
    }

    /// Number of rings, counting a trailing partial ring.
    pub fn num_rings(&self) -> usize {
        if self.ring_size == 0 {
            return 0;
        }
        self.num_cells.div_ceil(self.ring_size)
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ring_size == 0 {
            return Err(ValidationError::InvalidModel(
                "ring size must be at least 1".to_string(),
            ));
        }
        if !(self.min_delay.is_finite() && self.min_delay > 0.0) {
            return Err(ValidationError::InvalidModel(format!(
                "min delay must be positive, got {}",
                self.min_delay
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ValidationError::InvalidModel(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ValidationError::InvalidModel(format!(
                "duration must be non-negative, got {}",
                self.duration
            )));
        }
        if !self.event_weight.is_finite() {
            return Err(ValidationError::InvalidModel(
                "event weight must be finite".to_string(),
            ));
        }
        // Load synapse sources are drawn from [0, num_cells - 2)
        if self.cell.synapses > 0 && self.num_cells < 3 {
            return Err(ValidationError::InvalidModel(format!(
                "{} random synapses requested but at least 3 cells are needed, got {}",
                self.cell.synapses, self.num_cells
            )));
        }
        if self.num_connections().is_none() {
            return Err(ValidationError::InvalidModel(format!(
                "{} cells with {} random synapses each overflow the connection count",
                self.num_cells, self.cell.synapses
            )));
        }
        self.validate_cell()
    }

    /// Total incoming connections over the network: one ring connection plus
    /// `synapses` load connections per cell. `None` on overflow.
    pub fn num_connections(&self) -> Option<usize> {
        self.cell.synapses.checked_add(1)?.checked_mul(self.num_cells)
    }

    fn validate_cell(&self) -> Result<(), ValidationError> {
        let cell = &self.cell;
        if cell.branch_probs.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(ValidationError::InvalidCell(format!(
                "branch probabilities must lie in [0, 1], got {:?}",
                cell.branch_probs
            )));
        }
        if cell.compartments.contains(&0) {
            return Err(ValidationError::InvalidCell(format!(
                "compartments per branch must be at least 1, got {:?}",
                cell.compartments
            )));
        }
        if cell.lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(ValidationError::InvalidCell(format!(
                "branch lengths must be positive, got {:?}",
                cell.lengths
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "parameters")?;
        writeln!(f, "  name         : {:>10}", self.name)?;
        writeln!(f, "  cells        : {:10}", self.num_cells)?;
        writeln!(f, "  ring size    : {:10}", self.ring_size)?;
        writeln!(f, "  duration     : {:10.0} ms", self.duration)?;
        writeln!(f, "  min delay    : {:10.0} ms", self.min_delay)?;
        writeln!(f, "  dt           : {:10.3} ms", self.dt)?;
        write!(f, "{}", self.cell)
    }
}

/// On-disk parameter file. Every key is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParameterFile {
    pub name: String,
    pub duration: f64,
    pub dt: f64,
    pub num_cells: usize,
    pub ring_size: usize,
    pub min_delay: f64,
    pub event_weight: f64,
    pub depth: u32,
    pub branch_probs: [f64; 2],
    pub compartments: [u32; 2],
    pub lengths: [f64; 2],
    pub synapses: usize,
    pub complex: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid model parameters: {0}")]
    InvalidModel(String),
    #[error("Invalid cell parameters: {0}")]
    InvalidCell(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ModelParameters {
        ModelParameters::new(200.0, 256, 4, CellParameters::new([1.0, 0.5], [1, 1], 10))
    }

    #[test]
    fn test_defaults() {
        let params = defaults();
        assert_eq!(params.name, "default");
        assert_eq!(params.num_cells, 1024);
        assert_eq!(params.ring_size, 4);
        assert_eq!(params.min_delay, 10.0);
        assert_eq!(params.event_weight, 0.01);
        assert_eq!(params.cell.max_depth, 5);
        assert_eq!(params.cell.lengths, [200.0, 20.0]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_num_rings_counts_partial_ring() {
        let mut params = defaults();
        params.num_cells = 6;
        assert_eq!(params.num_rings(), 2);
        params.num_cells = 8;
        assert_eq!(params.num_rings(), 2);
        params.num_cells = 0;
        assert_eq!(params.num_rings(), 0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut params = defaults();
        params.ring_size = 0;
        assert!(matches!(params.validate(), Err(ValidationError::InvalidModel(_))));

        let mut params = defaults();
        params.min_delay = 0.0;
        assert!(params.validate().is_err());

        let mut params = defaults();
        params.num_cells = 2;
        assert!(params.validate().is_err());
        params.cell.synapses = 0;
        assert!(params.validate().is_ok());

        let mut params = defaults();
        params.cell.branch_probs = [1.5, 0.5];
        assert!(matches!(params.validate(), Err(ValidationError::InvalidCell(_))));

        let mut params = defaults();
        params.cell.compartments = [0, 1];
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_connection_overflow() {
        let mut params = defaults();
        assert_eq!(params.num_connections(), Some(11 * 1024));
        params.cell.synapses = usize::MAX;
        assert_eq!(params.num_connections(), None);
        assert!(matches!(params.validate(), Err(ValidationError::InvalidModel(_))));

        params.cell.synapses = usize::MAX / 1024;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_display_mentions_key_values() {
        let text = defaults().to_string();
        assert!(text.contains("ring size"));
        assert!(text.contains("1024"));
        assert!(text.contains("cell parameters"));
    }
}
