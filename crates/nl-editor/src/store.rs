//! Connection store: the authoritative list of connections.
//!
//! Writes are optimistic. The in-memory list changes first; the persistence
//! hook is then invoked fire-and-forget, and a failing hook is logged, never
//! rolled back and never surfaced to the user.
//!
//! The list is either owned by the store (uncontrolled) or lives with the
//! host and is read and replaced through [`ConnectionList`] (controlled).

use nl_core::id::{ConnectionId, NodeId};
use nl_core::model::{Anchor, Connection};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Failure reported by a persistence hook.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),
    #[error("persistence backend refused the change: {0}")]
    Refused(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode connection snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode connection snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk shape of [`ConnectionStore::snapshot`].
#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    version: u32,
    connections: Vec<Connection>,
}

/// External save/delete hooks.
pub trait ConnectionPersistence {
    fn on_create(&mut self, connection: &Connection) -> Result<(), PersistError>;
    fn on_delete(&mut self, id: ConnectionId) -> Result<(), PersistError>;
}

/// A host-owned connection list (controlled mode).
pub trait ConnectionList {
    fn connections(&self) -> Vec<Connection>;
    fn set_connections(&mut self, next: Vec<Connection>);
}

impl ConnectionList for Rc<RefCell<Vec<Connection>>> {
    fn connections(&self) -> Vec<Connection> {
        self.borrow().clone()
    }

    fn set_connections(&mut self, next: Vec<Connection>) {
        *self.borrow_mut() = next;
    }
}

enum Backing {
    Owned(Vec<Connection>),
    Controlled(Box<dyn ConnectionList>),
}

pub struct ConnectionStore {
    backing: Backing,
    persistence: Option<Box<dyn ConnectionPersistence>>,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.backing {
            Backing::Owned(_) => "owned",
            Backing::Controlled(_) => "controlled",
        };
        f.debug_struct("ConnectionStore")
            .field("mode", &mode)
            .field("connections", &self.all())
            .field("persistence", &self.persistence.is_some())
            .finish()
    }
}

impl ConnectionStore {
    /// A store that owns its list.
    pub fn new() -> Self {
        Self {
            backing: Backing::Owned(Vec::new()),
            persistence: None,
        }
    }

    /// A store that reads and writes a host-owned list.
    pub fn controlled(list: impl ConnectionList + 'static) -> Self {
        Self {
            backing: Backing::Controlled(Box::new(list)),
            persistence: None,
        }
    }

    pub fn with_persistence(mut self, hooks: impl ConnectionPersistence + 'static) -> Self {
        self.persistence = Some(Box::new(hooks));
        self
    }

    pub fn set_persistence(&mut self, hooks: Option<Box<dyn ConnectionPersistence>>) {
        self.persistence = hooks;
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    fn read<R>(&self, f: impl FnOnce(&[Connection]) -> R) -> R {
        match &self.backing {
            Backing::Owned(list) => f(list),
            Backing::Controlled(ext) => f(&ext.connections()),
        }
    }

    fn write<R>(&mut self, f: impl FnOnce(&mut Vec<Connection>) -> R) -> R {
        match &mut self.backing {
            Backing::Owned(list) => f(list),
            Backing::Controlled(ext) => {
                let mut list = ext.connections();
                let result = f(&mut list);
                ext.set_connections(list);
                result
            }
        }
    }

    pub fn all(&self) -> Vec<Connection> {
        self.read(<[Connection]>::to_vec)
    }

    pub fn len(&self) -> usize {
        self.read(<[Connection]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.read(|list| list.iter().find(|c| c.id == id).cloned())
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.read(|list| list.iter().any(|c| c.id == id))
    }

    /// The connection occupying a `(from, to, to_anchor)` triple.
    pub fn find(&self, from: NodeId, to: NodeId, to_anchor: &Anchor) -> Option<Connection> {
        self.read(|list| list.iter().find(|c| c.same_link(from, to, to_anchor)).cloned())
    }

    /// Connections feeding into `node`.
    pub fn incoming(&self, node: NodeId) -> Vec<Connection> {
        self.read(|list| list.iter().filter(|c| c.to == node).cloned().collect())
    }

    /// Connections leaving `node`.
    pub fn outgoing(&self, node: NodeId) -> Vec<Connection> {
        self.read(|list| list.iter().filter(|c| c.from == node).cloned().collect())
    }

    // ─── Writes ──────────────────────────────────────────────────────────

    /// Append a connection unless it is a self-loop or its triple is
    /// already linked. Returns whether the list changed.
    pub fn create(&mut self, connection: Connection) -> bool {
        if connection.from == connection.to {
            log::debug!("refusing self-loop connection on {}", connection.from);
            return false;
        }
        let added = self.write(|list| {
            let duplicate = list
                .iter()
                .any(|c| c.same_link(connection.from, connection.to, &connection.to_anchor));
            if duplicate {
                return false;
            }
            list.push(connection.clone());
            true
        });
        if !added {
            log::trace!(
                "connection {} -> {}/{} already exists",
                connection.from,
                connection.to,
                connection.to_anchor
            );
            return false;
        }

        log::debug!(
            "created connection {} ({} -> {}/{})",
            connection.id,
            connection.from,
            connection.to,
            connection.to_anchor
        );
        if let Some(hooks) = self.persistence.as_mut()
            && let Err(err) = hooks.on_create(&connection)
        {
            log::warn!("saving connection {} failed: {err}", connection.id);
        }
        true
    }

    /// Remove a connection by id. Unknown ids are a no-op.
    pub fn delete(&mut self, id: ConnectionId) -> bool {
        let removed = self.write(|list| {
            let before = list.len();
            list.retain(|c| c.id != id);
            list.len() != before
        });
        if !removed {
            return false;
        }

        log::debug!("deleted connection {id}");
        if let Some(hooks) = self.persistence.as_mut()
            && let Err(err) = hooks.on_delete(id)
        {
            log::warn!("deleting connection {id} failed: {err}");
        }
        true
    }

    /// Delete every connection touching `node`. Returns the removed ids.
    pub fn remove_node(&mut self, node: NodeId) -> Vec<ConnectionId> {
        let ids: Vec<ConnectionId> = self.read(|list| {
            list.iter()
                .filter(|c| c.touches(node))
                .map(|c| c.id)
                .collect()
        });
        for id in &ids {
            self.delete(*id);
        }
        ids
    }

    /// Replace the whole list, e.g. when hydrating saved state. Self-loops
    /// and repeated triples are dropped; hooks are not called.
    pub fn load(&mut self, connections: Vec<Connection>) -> usize {
        let mut kept: Vec<Connection> = Vec::with_capacity(connections.len());
        for c in connections {
            if c.from == c.to || kept.iter().any(|k| k.same_link(c.from, c.to, &c.to_anchor)) {
                log::debug!("dropping invalid or duplicate saved connection {}", c.id);
                continue;
            }
            kept.push(c);
        }
        let n = kept.len();
        self.write(|list| *list = kept);
        n
    }

    /// MessagePack encoding of the current list.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = StoreSnapshot {
            version: SNAPSHOT_VERSION,
            connections: self.all(),
        };
        Ok(rmp_serde::to_vec_named(&snapshot)?)
    }

    /// Replace the list from a [`ConnectionStore::snapshot`] payload.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<usize, SnapshotError> {
        let snapshot: StoreSnapshot = rmp_serde::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        Ok(self.load(snapshot.connections))
    }
}
