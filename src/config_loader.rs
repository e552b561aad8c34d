use crate::params::{CellParameters, ModelParameters, ParameterFile};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Parameter values coming from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLineDefaults {
    pub duration: f64,
    pub num_rings: usize,
    pub num_ring_cells: usize,
    pub p_branch: [f64; 2],
    pub num_comparts: [u32; 2],
    pub num_rand_syns: usize,
}

impl Default for CommandLineDefaults {
    fn default() -> Self {
        Self {
            duration: 200.0,
            num_rings: 256,
            num_ring_cells: 4,
            p_branch: [1.0, 0.5],
            num_comparts: [1, 1],
            num_rand_syns: 10,
        }
    }
}

impl CommandLineDefaults {
    pub fn to_parameters(&self) -> ModelParameters {
        ModelParameters::new(
            self.duration,
            self.num_rings,
            self.num_ring_cells,
            CellParameters::new(self.p_branch, self.num_comparts, self.num_rand_syns),
        )
    }
}

/// Parse a parameter file. `.yaml`/`.yml` files go through serde_yaml,
/// everything else is treated as JSON.
pub fn read_parameter_file(path: &Path) -> Result<ParameterFile> {
    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open parameter file '{}'", path.display()))?;

    let is_yaml = path
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    let parsed: ParameterFile = if is_yaml {
        serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse YAML parameters '{}'", path.display()))?
    } else {
        serde_json::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse JSON parameters '{}'", path.display()))?
    };
    Ok(parsed)
}

/// Load and validate the model parameters.
///
/// A parameter file, when given, overrides the defaults and the command
/// line completely.
pub fn load_parameters(
    params_file: Option<&Path>,
    defaults: &CommandLineDefaults,
) -> Result<ModelParameters> {
    let params = match params_file {
        Some(path) => {
            info!(
                "Configuration file has been provided - this will overwrite default parameter \
                 values and such provided via commandline arguments."
            );
            let file = read_parameter_file(path)?;
            if file.complex {
                warn!(
                    "Cell type 'complex' is currently not supported. Using simple branchy cell instead."
                );
            }
            ModelParameters::from_file(&file)
        }
        None => {
            info!(
                "No configuration file has been provided - using default parameter values and \
                 such provided via commandline arguments."
            );
            defaults.to_parameters()
        }
    };

    params.validate()?;

    Ok(params)
}
