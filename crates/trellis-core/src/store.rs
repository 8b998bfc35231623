//! Graph store port and the table-backed implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{NodeRecord, RecordId, RelationshipRecord};

/// Store directory: .trellis/
pub const STORE_DIR: &str = ".trellis";

/// Mirrored table file
pub const GRAPH_FILE: &str = "graph.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown record id {0}")]
    UnknownId(RecordId),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Backend(String),
}

/// Port to the persistent graph store.
///
/// The store offers no isolation beyond flush ordering: callers doing
/// read-modify-write must serialize among themselves.
pub trait GraphStore: Send + Sync {
    /// All node rows.
    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError>;

    /// All relationship rows.
    fn relationships(&self) -> Result<Vec<RelationshipRecord>, StoreError>;

    /// Look up a single node.
    fn node(&self, id: RecordId) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.nodes()?.into_iter().find(|n| n.id == id))
    }

    /// Insert a node. The record's `id` is ignored; the assigned id is returned.
    fn insert_node(&self, node: NodeRecord) -> Result<RecordId, StoreError>;

    /// Insert a relationship. The record's `id` is ignored; the assigned id is returned.
    fn insert_relationship(&self, relationship: RelationshipRecord) -> Result<RecordId, StoreError>;

    /// Replace an existing node in place.
    fn update_node(&self, node: NodeRecord) -> Result<(), StoreError>;

    /// Delete a node. Returns false if it did not exist.
    fn delete_node(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Delete a relationship. Returns false if it did not exist.
    fn delete_relationship(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Persist pending changes.
    fn flush(&self) -> Result<(), StoreError>;
}

/// Get store directory path
pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

/// Get mirrored table file path
pub fn graph_file_path(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join(GRAPH_FILE)
}

/// Ensure store directory exists
pub fn ensure_store_dir(root: &Path) -> std::io::Result<()> {
    let dir = store_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    nodes: BTreeMap<RecordId, NodeRecord>,
    relationships: BTreeMap<RecordId, RelationshipRecord>,
}

impl Tables {
    fn allocate(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }
}

/// On-disk layout of the mirrored tables.
#[derive(Serialize, Deserialize)]
struct TableFile {
    version: String,
    next_id: u64,
    nodes: Vec<NodeRecord>,
    relationships: Vec<RelationshipRecord>,
    saved_at: chrono::DateTime<Utc>,
}

/// In-memory tables, optionally mirrored to `<root>/.trellis/graph.json`.
///
/// Writes only reach disk on [`GraphStore::flush`].
#[derive(Debug, Default)]
pub struct TableStore {
    tables: RwLock<Tables>,
    root: Option<PathBuf>,
}

impl TableStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) a disk-mirrored store under `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let path = graph_file_path(&root);

        let tables = if path.exists() {
            let json_str = std::fs::read_to_string(&path)?;
            let file: TableFile = serde_json::from_str(&json_str)?;
            tracing::debug!(
                "Loaded {} nodes, {} relationships from {}",
                file.nodes.len(),
                file.relationships.len(),
                path.display()
            );
            Tables {
                next_id: file.next_id,
                nodes: file.nodes.into_iter().map(|n| (n.id, n)).collect(),
                relationships: file.relationships.into_iter().map(|r| (r.id, r)).collect(),
            }
        } else {
            Tables::default()
        };

        Ok(TableStore {
            tables: RwLock::new(tables),
            root: Some(root),
        })
    }

    /// Directory the store mirrors into, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl GraphStore for TableStore {
    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError> {
        Ok(self.read()?.nodes.values().cloned().collect())
    }

    fn relationships(&self) -> Result<Vec<RelationshipRecord>, StoreError> {
        Ok(self.read()?.relationships.values().cloned().collect())
    }

    fn node(&self, id: RecordId) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.read()?.nodes.get(&id).cloned())
    }

    fn insert_node(&self, mut node: NodeRecord) -> Result<RecordId, StoreError> {
        let mut tables = self.write()?;
        let id = tables.allocate();
        node.id = id;
        tables.nodes.insert(id, node);
        Ok(id)
    }

    fn insert_relationship(&self, mut relationship: RelationshipRecord) -> Result<RecordId, StoreError> {
        let mut tables = self.write()?;
        let id = tables.allocate();
        relationship.id = id;
        tables.relationships.insert(id, relationship);
        Ok(id)
    }

    fn update_node(&self, node: NodeRecord) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        match tables.nodes.get_mut(&node.id) {
            Some(slot) => {
                *slot = node;
                Ok(())
            }
            None => Err(StoreError::UnknownId(node.id)),
        }
    }

    fn delete_node(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.write()?.nodes.remove(&id).is_some())
    }

    fn delete_relationship(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.write()?.relationships.remove(&id).is_some())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let json_str = {
            let tables = self.read()?;
            let file = TableFile {
                version: env!("CARGO_PKG_VERSION").to_string(),
                next_id: tables.next_id,
                nodes: tables.nodes.values().cloned().collect(),
                relationships: tables.relationships.values().cloned().collect(),
                saved_at: Utc::now(),
            };
            serde_json::to_string_pretty(&file)?
        };

        ensure_store_dir(root)?;
        let path = graph_file_path(root);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json_str)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!("Graph store flushed: {}", path.display());
        Ok(())
    }
}

/// Delete nodes and every relationship touching them, in either direction.
/// Returns the number of nodes actually deleted.
pub fn delete_nodes_cascading(
    store: &dyn GraphStore,
    ids: &std::collections::HashSet<RecordId>,
) -> Result<usize, StoreError> {
    if ids.is_empty() {
        return Ok(0);
    }

    for relationship in store.relationships()? {
        if ids.contains(&relationship.source_id) || ids.contains(&relationship.target_id) {
            store.delete_relationship(relationship.id)?;
        }
    }

    let mut deleted = 0;
    for id in ids {
        if store.delete_node(*id)? {
            deleted += 1;
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_insert_assigns_fresh_ids() {
        let store = TableStore::in_memory();
        let a = store.insert_node(NodeRecord::derived("p", "a", "file", None)).unwrap();
        let b = store.insert_node(NodeRecord::derived("p", "b", "file", None)).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.node(a).unwrap().unwrap().name, "a");
    }

    #[test]
    fn test_update_unknown_node_fails() {
        let store = TableStore::in_memory();
        let mut rec = NodeRecord::derived("p", "a", "file", None);
        rec.id = RecordId(99);
        assert!(matches!(store.update_node(rec), Err(StoreError::UnknownId(RecordId(99)))));
    }

    #[test]
    fn test_cascading_delete_removes_both_directions() {
        let store = TableStore::in_memory();
        let a = store.insert_node(NodeRecord::derived("p", "a", "file", None)).unwrap();
        let b = store.insert_node(NodeRecord::derived("p", "b", "file", None)).unwrap();
        let c = store.insert_node(NodeRecord::derived("p", "c", "file", None)).unwrap();
        store.insert_relationship(RelationshipRecord::new("p", a, b, "calls")).unwrap();
        store.insert_relationship(RelationshipRecord::new("p", c, a, "imports")).unwrap();
        store.insert_relationship(RelationshipRecord::new("p", b, c, "calls")).unwrap();

        let deleted = delete_nodes_cascading(&store, &HashSet::from([a])).unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.nodes().unwrap().len(), 2);
        let remaining = store.relationships().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].touches(a));
    }

    #[test]
    fn test_flush_and_reopen_round_trips_tables() {
        let temp_dir = TempDir::new().unwrap();
        let store = TableStore::open(temp_dir.path()).unwrap();
        let a = store.insert_node(NodeRecord::derived("p", "a", "file", None)).unwrap();
        let b = store.insert_node(NodeRecord::derived("p", "b", "file", None)).unwrap();
        store.insert_relationship(RelationshipRecord::new("p", a, b, "contains")).unwrap();
        store.flush().unwrap();

        assert!(graph_file_path(temp_dir.path()).exists());

        let reopened = TableStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.nodes().unwrap(), store.nodes().unwrap());
        assert_eq!(reopened.relationships().unwrap().len(), 1);

        // ids keep increasing after reopen
        let c = reopened.insert_node(NodeRecord::derived("p", "c", "file", None)).unwrap();
        assert!(c > b);
    }

    #[test]
    fn test_unflushed_writes_do_not_reach_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = TableStore::open(temp_dir.path()).unwrap();
        store.insert_node(NodeRecord::derived("p", "a", "file", None)).unwrap();

        let reopened = TableStore::open(temp_dir.path()).unwrap();
        assert!(reopened.nodes().unwrap().is_empty());
    }

    #[test]
    fn test_in_memory_flush_is_noop() {
        let store = TableStore::in_memory();
        assert!(store.flush().is_ok());
        assert!(store.root().is_none());
    }
}
