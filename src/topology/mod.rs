//! Ring topology generation.
//!
//! This module decides which gids a worker owns and which connections each
//! owned cell receives: one predecessor link inside its ring, a stimulus if
//! it starts the ring, and a fixed number of random zero-weight load links.

pub mod types;
pub mod partition;
pub mod ring;
pub mod random;

// Re-export key types and functions for easier access
pub use types::{Connection, ConnectionKind, Stimulus};
pub use partition::{owned_gids, owner_of};
pub use ring::{Ring, RingWiring};
pub use random::RandomSynapseGenerator;
