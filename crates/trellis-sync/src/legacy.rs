//! Compatibility pass for per-file nodes left by the old one-node-per-file sync
//!
//! Runs before every reconciliation and is idempotent: once a project holds
//! no marked nodes it deletes nothing. Remove this module when no store still
//! carries `workspace_file` nodes.

use std::collections::HashSet;

use tracing::info;
use trellis_core::{GraphStore, RecordId, StoreError, delete_nodes_cascading};

/// Delete every legacy per-file node of `project_id` and all relationships
/// touching them. Returns the number of nodes deleted.
pub fn purge_legacy_file_nodes(store: &dyn GraphStore, project_id: &str) -> Result<usize, StoreError> {
    let ids: HashSet<RecordId> = store
        .nodes()?
        .into_iter()
        .filter(|n| n.project_id == project_id && n.meta().is_legacy_file())
        .map(|n| n.id)
        .collect();

    if ids.is_empty() {
        return Ok(0);
    }

    let deleted = delete_nodes_cascading(store, &ids)?;
    info!("Purged {} legacy per-file nodes for project {}", deleted, project_id);
    Ok(deleted)
}
