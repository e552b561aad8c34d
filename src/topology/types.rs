//! Connection and stimulus records.
//!
//! These are the edges a worker creates while wiring its cells. The worker's
//! [`crate::network::RingNetwork`] owns them for the lifetime of the run.

use serde::Serialize;

use crate::Gid;

/// Origin of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Predecessor link inside a ring
    Ring,
    /// Zero-weight connection that only loads event delivery
    Load,
}

/// A connection from any source gid to a slot on a local cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub source: Gid,
    pub target: Gid,
    pub slot: usize,
    pub weight: f64,
    pub delay: f64,
    pub kind: ConnectionKind,
}

/// Single-pulse source attached to the first cell of a ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stimulus {
    pub target: Gid,
    pub slot: usize,
    /// Time of the single event
    pub start: f64,
    /// Number of events emitted
    pub number: u32,
    pub delay: f64,
    pub weight: f64,
}

impl Stimulus {
    /// Fixed delay between the stimulus event and its arrival at the target
    pub const DELAY: f64 = 1.0;

    pub fn new(target: Gid, weight: f64) -> Self {
        Self {
            target,
            slot: 0,
            start: 0.0,
            number: 1,
            delay: Self::DELAY,
            weight,
        }
    }
}
