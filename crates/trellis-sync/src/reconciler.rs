//! Workspace reconciliation against the graph store
//!
//! Each workspace is represented by exactly one service node embedding the
//! last scanned tree. A sync rescans the workspace, diffs the fresh tree
//! against that snapshot, deletes graph nodes derived from removed paths and
//! stores the new snapshot.
//!
//! No lock is taken on (project, workspace): two syncs of the same workspace
//! racing through the read-modify-write below can lose an update. Callers
//! serialize syncs per workspace.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use trellis_core::{
    FileTreeNode, GraphStore, Position, RecordId, ServiceMeta, ServiceNode, ServiceStatus,
    SnapshotDiff, SERVICE_NODE_TYPE, delete_nodes_cascading,
};
use trellis_indexer::Scanner;

use crate::error::Result;
use crate::legacy::purge_legacy_file_nodes;

/// Canvas position given to a newly created service node.
pub const DEFAULT_SERVICE_POSITION: Position = Position::new(100.0, 100.0);

/// Outcome of one sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub service_id: RecordId,
    /// Service nodes created (0 or 1).
    pub created: usize,
    /// Service nodes updated in place (0 or 1).
    pub updated: usize,
    /// Graph nodes deleted, legacy nodes included.
    pub removed: usize,
    pub removed_paths: Vec<PathBuf>,
    pub added_paths: Vec<PathBuf>,
    pub tree: FileTreeNode,
}

pub struct Reconciler<'a> {
    store: &'a dyn GraphStore,
    scanner: &'a Scanner,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn GraphStore, scanner: &'a Scanner) -> Self {
        Reconciler { store, scanner }
    }

    /// Rescan `workspace_path` and reconcile it into the store.
    pub fn sync(&self, project_id: &str, workspace_path: &Path) -> Result<SyncSummary> {
        let tree = self.scanner.scan(workspace_path)?.tree;
        let workspace_name = tree.name.clone();
        info!("Syncing workspace {} for project {}", workspace_name, project_id);

        let existing = self.find_service(project_id, &workspace_name)?;
        let mut removed = purge_legacy_file_nodes(self.store, project_id)?;

        let (service_id, created, updated, diff) = match existing {
            Some(service) => {
                let diff = SnapshotDiff::compute(service.snapshot(), &tree);
                removed += self.purge_removed_paths(project_id, &diff.removed)?;
                let id = self.update_service(service, &tree)?;
                (id, 0, 1, diff)
            }
            None => {
                let diff = SnapshotDiff::compute(None, &tree);
                let id = self.create_service(project_id, &workspace_name, &tree)?;
                (id, 1, 0, diff)
            }
        };

        self.store.flush()?;

        info!(
            "Synced {} (service {}): {} paths added, {} paths removed, {} nodes deleted",
            workspace_name,
            service_id,
            diff.added.len(),
            diff.removed.len(),
            removed
        );

        Ok(SyncSummary {
            service_id,
            created,
            updated,
            removed,
            removed_paths: diff.removed.into_iter().collect(),
            added_paths: diff.added.into_iter().collect(),
            tree,
        })
    }

    /// The service node for (project, workspace name), if any. Should several
    /// exist, the oldest one wins.
    pub fn find_service(&self, project_id: &str, workspace_name: &str) -> Result<Option<ServiceNode>> {
        let mut matches: Vec<ServiceNode> = self
            .store
            .nodes()?
            .iter()
            .filter(|n| {
                n.project_id == project_id
                    && n.node_type == SERVICE_NODE_TYPE
                    && n.name == workspace_name
            })
            .filter_map(ServiceNode::from_record)
            .collect();

        matches.sort_by_key(|s| s.id);
        if matches.len() > 1 {
            warn!(
                "{} service nodes for workspace {} in project {}; using {}",
                matches.len(),
                workspace_name,
                project_id,
                matches[0].id
            );
        }
        Ok(matches.into_iter().next())
    }

    /// Delete nodes of the project derived from any removed path.
    fn purge_removed_paths(&self, project_id: &str, removed: &BTreeSet<PathBuf>) -> Result<usize> {
        if removed.is_empty() {
            return Ok(0);
        }

        let ids: HashSet<RecordId> = self
            .store
            .nodes()?
            .iter()
            .filter(|n| n.project_id == project_id)
            .filter(|n| n.meta().provenance().is_some_and(|p| removed.contains(p)))
            .map(|n| n.id)
            .collect();

        debug!("{} nodes derived from {} removed paths", ids.len(), removed.len());
        Ok(delete_nodes_cascading(self.store, &ids)?)
    }

    fn update_service(&self, mut service: ServiceNode, tree: &FileTreeNode) -> Result<RecordId> {
        let now = Utc::now();
        service.meta.workspace_path = tree.path.clone();
        service.meta.snapshot = Some(tree.clone());
        service.meta.last_synced = Some(now);
        service.updated_at = now;

        self.store.update_node(service.to_record()?)?;
        Ok(service.id)
    }

    fn create_service(&self, project_id: &str, workspace_name: &str, tree: &FileTreeNode) -> Result<RecordId> {
        let now = Utc::now();
        let service = ServiceNode {
            id: RecordId::default(),
            project_id: project_id.to_string(),
            name: workspace_name.to_string(),
            meta: ServiceMeta {
                workspace_path: tree.path.clone(),
                snapshot: Some(tree.clone()),
                last_synced: Some(now),
                status: ServiceStatus::Running,
                position: DEFAULT_SERVICE_POSITION,
            },
            created_at: now,
            updated_at: now,
        };

        let id = self.store.insert_node(service.to_record()?)?;
        debug!("Created service node {} for {}", id, workspace_name);
        Ok(id)
    }
}
