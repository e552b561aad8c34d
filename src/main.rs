use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use busyring::cell::BranchyCellFactory;
use busyring::cluster::run_cluster;
use busyring::config_loader::{self, CommandLineDefaults};
use busyring::export::write_topology;

/// Build the busy-ring benchmark network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of rings
    #[arg(long, default_value_t = 256)]
    num_rings: usize,

    /// Number of cells per ring
    #[arg(long, default_value_t = 4)]
    num_ring_cells: usize,

    /// Number of random synapses of weight 0 per cell
    #[arg(long, default_value_t = 10)]
    num_rand_syns: usize,

    /// Range of branching probabilities at each level
    #[arg(long, num_args = 2, value_names = ["ROOT", "TIP"], default_values_t = [1.0, 0.5])]
    p_branch: Vec<f64>,

    /// Range of compartments per branch
    #[arg(long, num_args = 2, value_names = ["ROOT", "TIP"], default_values_t = [1, 1])]
    num_comparts: Vec<u32>,

    /// Parameter file (JSON or YAML); overrides all other model options
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Duration of the simulation in ms
    #[arg(long, default_value_t = 200.0)]
    duration: f64,

    /// Threads per rank for the simulation engine
    #[arg(long, default_value_t = 1)]
    num_threads: usize,

    /// Number of in-process ranks building the network
    #[arg(long, default_value_t = 1)]
    ranks: usize,

    /// Write the merged topology as JSON
    #[arg(long)]
    topology_out: Option<PathBuf>,
}

impl Args {
    fn defaults(&self) -> CommandLineDefaults {
        CommandLineDefaults {
            duration: self.duration,
            num_rings: self.num_rings,
            num_ring_cells: self.num_ring_cells,
            p_branch: [self.p_branch[0], self.p_branch[1]],
            num_comparts: [self.num_comparts[0], self.num_comparts[1]],
            num_rand_syns: self.num_rand_syns,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let params = config_loader::load_parameters(args.params_file.as_deref(), &args.defaults())?;

    match &args.params_file {
        Some(path) => info!("Configuration (loaded from {}):", path.display()),
        None => info!("Configuration:"),
    }
    info!("  Total number of cells: {}", params.num_cells);
    info!("  Cells per ring: {}", params.ring_size);
    info!("  Branching probabilities: {:?}", params.cell.branch_probs);
    info!("  Compartments per cell: {:?}", params.cell.compartments);
    info!("  Random synapses per cell: {}", params.cell.synapses);
    info!("  Engine threads per rank: {}", args.num_threads);

    let run = run_cluster(&params, args.ranks, &BranchyCellFactory)
        .wrap_err("Failed to build ring network")?;

    let total_connections: usize = run.networks().iter().map(|n| n.connections().len()).sum();
    info!(
        "Built {} connections and {} stimuli on {} ranks",
        total_connections,
        run.stimuli().len(),
        run.num_ranks()
    );

    if let Some(path) = &args.topology_out {
        write_topology(path, &params, &run)?;
    }

    info!("Network construction completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["busyring"]);
        assert_eq!(args.num_rings, 256);
        assert_eq!(args.num_ring_cells, 4);
        assert_eq!(args.p_branch, vec![1.0, 0.5]);
        assert_eq!(args.num_comparts, vec![1, 1]);
        assert_eq!(args.ranks, 1);
        assert_eq!(args.defaults(), CommandLineDefaults::default());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "busyring",
            "--num-rings", "8",
            "--num-ring-cells", "5",
            "--p-branch", "0.8", "0.2",
            "--num-comparts", "3", "1",
            "--ranks", "4",
            "--params-file", "ring.json",
        ]);
        assert_eq!(args.num_rings, 8);
        assert_eq!(args.defaults().p_branch, [0.8, 0.2]);
        assert_eq!(args.defaults().num_comparts, [3, 1]);
        assert_eq!(args.ranks, 4);
        assert_eq!(args.params_file, Some(PathBuf::from("ring.json")));
    }
}
