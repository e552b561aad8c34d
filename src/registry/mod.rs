//! # Distributed gid registry
//!
//! The registry is the only piece of state that conceptually spans workers:
//! it maps every gid to the worker that owns it and creates connections from
//! arbitrary source gids to slots on locally owned cells. Source gids do not
//! have to be local, which is how rings and load connections cross worker
//! boundaries.
//!
//! The network builder receives the registry as a `&mut dyn
//! DistributedRegistry`, so a real cluster backend can be swapped in without
//! touching the topology code. [`LocalRegistry`] is the in-process backend
//! used by the bundled runner and the tests.
//!
//! ## Rules enforced by `LocalRegistry`
//!
//! - a gid is registered at most once
//! - every gid, source or target, lies in `[0, num_cells)`
//! - connection targets must be registered on this worker
//! - target slots must exist on the target cell

use std::collections::HashMap;

use log::debug;

use crate::error::RegistryError;
use crate::topology::types::{Connection, ConnectionKind};
use crate::Gid;

/// Gid ownership and connection primitive shared by all workers.
pub trait DistributedRegistry {
    /// Associate `gid` with `worker`.
    fn register(&mut self, gid: Gid, worker: usize) -> Result<(), RegistryError>;

    /// Create a connection from `source` to `slot` of the local cell
    /// `target`. The caller owns the returned handle and sets its weight and
    /// delay.
    fn connect(&mut self, source: Gid, target: Gid, slot: usize) -> Result<Connection, RegistryError>;

    /// Worker owning `gid`, if it has been registered.
    fn owner(&self, gid: Gid) -> Option<usize>;
}

/// Registry for one worker of an in-process cluster
#[derive(Debug)]
pub struct LocalRegistry {
    rank: usize,
    num_cells: usize,
    slots_per_cell: usize,
    owners: HashMap<Gid, usize>,
    connections_made: usize,
}

impl LocalRegistry {
    pub fn new(rank: usize, num_cells: usize, slots_per_cell: usize) -> Self {
        Self {
            rank,
            num_cells,
            slots_per_cell,
            owners: HashMap::new(),
            connections_made: 0,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of connections handed out so far
    pub fn connections_made(&self) -> usize {
        self.connections_made
    }

    /// Gids registered on this worker
    pub fn local_count(&self) -> usize {
        self.owners.values().filter(|&&owner| owner == self.rank).count()
    }

    fn check_gid(&self, gid: Gid) -> Result<(), RegistryError> {
        if gid >= self.num_cells {
            return Err(RegistryError::UnknownGid {
                gid,
                num_cells: self.num_cells,
            });
        }
        Ok(())
    }
}

impl DistributedRegistry for LocalRegistry {
    fn register(&mut self, gid: Gid, worker: usize) -> Result<(), RegistryError> {
        self.check_gid(gid)?;
        if let Some(&owner) = self.owners.get(&gid) {
            return Err(RegistryError::AlreadyRegistered { gid, owner });
        }
        self.owners.insert(gid, worker);
        debug!("Registered gid {} on worker {}", gid, worker);
        Ok(())
    }

    fn connect(&mut self, source: Gid, target: Gid, slot: usize) -> Result<Connection, RegistryError> {
        self.check_gid(source)?;
        self.check_gid(target)?;
        if self.owners.get(&target) != Some(&self.rank) {
            return Err(RegistryError::NotLocal(target));
        }
        if slot >= self.slots_per_cell {
            return Err(RegistryError::SlotOutOfRange {
                gid: target,
                slot,
                num_slots: self.slots_per_cell,
            });
        }
        self.connections_made += 1;
        Ok(Connection {
            source,
            target,
            slot,
            weight: 0.0,
            delay: 1.0,
            kind: ConnectionKind::Load,
        })
    }

    fn owner(&self, gid: Gid) -> Option<usize> {
        self.owners.get(&gid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_connect() {
        let mut registry = LocalRegistry::new(1, 8, 3);
        registry.register(1, 1).unwrap();
        registry.register(5, 1).unwrap();
        assert_eq!(registry.owner(5), Some(1));
        assert_eq!(registry.owner(2), None);
        assert_eq!(registry.local_count(), 2);

        // Source on another worker is fine
        let connection = registry.connect(2, 5, 2).unwrap();
        assert_eq!((connection.source, connection.target, connection.slot), (2, 5, 2));
        assert_eq!(registry.connections_made(), 1);
    }

    #[test]
    fn test_rejections() {
        let mut registry = LocalRegistry::new(0, 4, 2);
        registry.register(0, 0).unwrap();
        registry.register(1, 1).unwrap();

        assert_eq!(
            registry.register(0, 0),
            Err(RegistryError::AlreadyRegistered { gid: 0, owner: 0 })
        );
        assert!(matches!(registry.register(4, 0), Err(RegistryError::UnknownGid { .. })));
        assert_eq!(registry.connect(0, 1, 0), Err(RegistryError::NotLocal(1)));
        assert!(matches!(registry.connect(9, 0, 0), Err(RegistryError::UnknownGid { .. })));
        assert!(matches!(
            registry.connect(1, 0, 2),
            Err(RegistryError::SlotOutOfRange { slot: 2, .. })
        ));
        assert_eq!(registry.connections_made(), 0);
    }
}
