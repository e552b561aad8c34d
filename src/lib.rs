//! # Busyring - distributed ring-network topology generator
//!
//! This library builds the synthetic "busy ring" network used to benchmark
//! spiking-network simulators: many independent rings of cells, each cell
//! also receiving a configurable number of zero-weight load connections that
//! exercise event delivery without changing the dynamics.
//!
//! ## Overview
//!
//! Gids are dealt round-robin over the workers. Every worker builds its own
//! cells and their incoming connections without talking to the others; the
//! only collective step is the statistics reduction at the end. Load
//! connections are drawn from generators seeded by the target gid, so the
//! generated graph does not depend on the number of workers.
//!
//! ## Architecture
//!
//! - `params`: Model and cell parameters, validation
//! - `config_loader`: Parameter file loading and command-line defaults
//! - `topology`: Partitioning, ring wiring and random load connections
//! - `cell`: Cell factory interface and the branchy cell model
//! - `registry`: Gid ownership and connection primitive
//! - `collective`: Blocking sum reduction across workers
//! - `stats`: Cell totals and created-vs-expected checks
//! - `network`: Per-worker network construction
//! - `cluster`: In-process multi-rank runner
//! - `export`: JSON dump of the merged topology
//! - `log_scrape`: Parser for the `Cell stats:` log line
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use busyring::cell::BranchyCellFactory;
//! use busyring::{cluster, config_loader};
//!
//! let defaults = config_loader::CommandLineDefaults::default();
//! let params = config_loader::load_parameters(None, &defaults)?;
//!
//! let run = cluster::run_cluster(&params, 4, &BranchyCellFactory)?;
//! println!("{}", run.cell_stats().unwrap());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Parameter File Format
//!
//! JSON (or YAML) with every key present:
//!
//! ```json
//! {
//!   "name": "simple-n=1024-stdp=off-depth=2",
//!   "duration": 200, "dt": 0.025,
//!   "num-cells": 1024, "ring-size": 4,
//!   "min-delay": 10, "event-weight": 0.01,
//!   "depth": 2, "branch-probs": [1.0, 0.5], "compartments": [1, 1],
//!   "lengths": [200, 20], "synapses": 10, "complex": false
//! }
//! ```
//!
//! ## Error Handling
//!
//! Network construction returns `BuildError`; every error is fatal. File
//! handling and the binary use `color_eyre` reports.

pub mod error;
pub mod params;
pub mod config_loader;

pub mod topology;
pub mod cell;
pub mod registry;
pub mod collective;
pub mod stats;
pub mod network;
pub mod cluster;
pub mod export;
pub mod log_scrape;

pub use error::{BuildError, RegistryError};
pub use network::RingNetwork;

/// Global cell identifier
pub type Gid = usize;
