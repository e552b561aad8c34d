//! JSON export of a generated topology.
//!
//! Connections and stimuli from all ranks are merged and sorted by target,
//! so dumps produced with different rank counts can be compared directly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::Serialize;

use crate::cluster::ClusterRun;
use crate::params::{ModelParameters, ParameterFile};
use crate::stats::{CellStats, WiringReport};
use crate::topology::{Connection, Stimulus};

#[derive(Debug, Serialize)]
pub struct TopologyDump<'a> {
    pub parameters: ParameterFile,
    pub num_ranks: usize,
    pub cell_stats: Option<&'a CellStats>,
    pub reports: Vec<&'a WiringReport>,
    pub connections: Vec<&'a Connection>,
    pub stimuli: Vec<&'a Stimulus>,
}

impl<'a> TopologyDump<'a> {
    pub fn new(params: &ModelParameters, run: &'a ClusterRun) -> Self {
        Self {
            parameters: params.to_file(),
            num_ranks: run.num_ranks(),
            cell_stats: run.cell_stats(),
            reports: run.networks().iter().map(|n| n.report()).collect(),
            connections: run.connections(),
            stimuli: run.stimuli(),
        }
    }
}

/// Write the merged topology of `run` to `path` as pretty-printed JSON.
pub fn write_topology(path: &Path, params: &ModelParameters, run: &ClusterRun) -> Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create topology file '{}'", path.display()))?;
    let dump = TopologyDump::new(params, run);
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &dump)
        .wrap_err_with(|| format!("Failed to write topology to '{}'", path.display()))?;
    writer.flush()?;
    info!(
        "Wrote {} connections and {} stimuli to {:?}",
        dump.connections.len(),
        dump.stimuli.len(),
        path
    );
    Ok(())
}
