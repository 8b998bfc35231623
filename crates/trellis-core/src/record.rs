//! Persisted graph records and the typed metadata parsed from them
//!
//! Records are what the store holds: generic nodes and relationships carrying
//! a loose JSON `metadata` blob. The blob is parsed exactly once, here, into
//! [`NodeMeta`] / [`ServiceNode`]; nothing past this module reads raw metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{FileTreeNode, Position};
use crate::store::StoreError;

/// `node_type` of the single node that represents a whole workspace. Kept
/// outside the [`SemanticType`](crate::model::SemanticType) vocabulary so a
/// derived node classified `service` is never mistaken for it.
pub const SERVICE_NODE_TYPE: &str = "workspace-service";

/// Metadata key holding the file path a derived node was built from.
pub const PROVENANCE_KEY: &str = "source_path";

/// Metadata flag set on per-file nodes written by the old one-node-per-file sync.
pub const LEGACY_FILE_MARKER: &str = "workspace_file";

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(RecordId)
    }
}

/// A node row as the store keeps it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub id: RecordId,
    pub project_id: String,
    pub name: String,
    pub node_type: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NodeRecord {
    /// A node derived from a workspace file. The id is assigned on insert.
    pub fn derived(
        project_id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        source_path: Option<PathBuf>,
    ) -> Self {
        let metadata = match source_path {
            Some(path) => serde_json::json!({ PROVENANCE_KEY: path }),
            None => Value::Null,
        };
        let now = Utc::now();
        NodeRecord {
            id: RecordId::default(),
            project_id: project_id.into(),
            name: name.into(),
            node_type: node_type.into(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the metadata blob into its typed form.
    pub fn meta(&self) -> NodeMeta {
        NodeMeta::parse(self)
    }
}

/// A relationship row as the store keeps it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRecord {
    pub id: RecordId,
    pub project_id: String,
    pub source_id: RecordId,
    pub target_id: RecordId,
    pub kind: String,
    #[serde(default)]
    pub metadata: Value,
}

impl RelationshipRecord {
    pub fn new(
        project_id: impl Into<String>,
        source_id: RecordId,
        target_id: RecordId,
        kind: impl Into<String>,
    ) -> Self {
        RelationshipRecord {
            id: RecordId::default(),
            project_id: project_id.into(),
            source_id,
            target_id,
            kind: kind.into(),
            metadata: Value::Null,
        }
    }

    /// True if either endpoint is `id`.
    pub fn touches(&self, id: RecordId) -> bool {
        self.source_id == id || self.target_id == id
    }
}

/// Typed view of a node's metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeMeta {
    Service(ServiceMeta),
    Derived(DerivedMeta),
}

impl NodeMeta {
    fn parse(record: &NodeRecord) -> Self {
        if record.node_type == SERVICE_NODE_TYPE {
            return NodeMeta::Service(ServiceMeta::from_value(record.id, &record.metadata));
        }

        let provenance = record
            .metadata
            .get(PROVENANCE_KEY)
            .and_then(Value::as_str)
            .map(PathBuf::from);
        let legacy_file = record
            .metadata
            .get(LEGACY_FILE_MARKER)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        NodeMeta::Derived(DerivedMeta {
            provenance,
            legacy_file,
        })
    }

    /// The file path this node was derived from, if it records one.
    pub fn provenance(&self) -> Option<&PathBuf> {
        match self {
            NodeMeta::Derived(meta) => meta.provenance.as_ref(),
            NodeMeta::Service(_) => None,
        }
    }

    pub fn is_legacy_file(&self) -> bool {
        matches!(self, NodeMeta::Derived(meta) if meta.legacy_file)
    }
}

/// Metadata of any node other than a service node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedMeta {
    pub provenance: Option<PathBuf>,
    pub legacy_file: bool,
}

/// Lifecycle status shown on a service node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Running,
    Stopped,
    Error,
}

/// Metadata embedded in a service node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServiceMeta {
    #[serde(default)]
    pub workspace_path: PathBuf,
    /// Last scanned tree. `None` when never stored or unreadable.
    #[serde(default, deserialize_with = "lenient_snapshot")]
    pub snapshot: Option<FileTreeNode>,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub position: Position,
}

impl ServiceMeta {
    fn from_value(id: RecordId, value: &Value) -> Self {
        match ServiceMeta::deserialize(value) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("Service node {} has malformed metadata: {}", id, e);
                ServiceMeta::default()
            }
        }
    }
}

fn lenient_snapshot<'de, D>(deserializer: D) -> Result<Option<FileTreeNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(tree) => Some(tree),
        Err(e) => {
            tracing::warn!("Discarding malformed snapshot: {}", e);
            None
        }
    }))
}

/// The single persisted node representing one workspace of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceNode {
    pub id: RecordId,
    pub project_id: String,
    /// Workspace directory name; unique per project.
    pub name: String,
    pub meta: ServiceMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceNode {
    /// `None` unless the record is a service node.
    pub fn from_record(record: &NodeRecord) -> Option<Self> {
        match record.meta() {
            NodeMeta::Service(meta) => Some(ServiceNode {
                id: record.id,
                project_id: record.project_id.clone(),
                name: record.name.clone(),
                meta,
                created_at: record.created_at,
                updated_at: record.updated_at,
            }),
            NodeMeta::Derived(_) => None,
        }
    }

    pub fn to_record(&self) -> Result<NodeRecord, StoreError> {
        Ok(NodeRecord {
            id: self.id,
            project_id: self.project_id.clone(),
            name: self.name.clone(),
            node_type: SERVICE_NODE_TYPE.to_string(),
            metadata: serde_json::to_value(&self.meta)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn snapshot(&self) -> Option<&FileTreeNode> {
        self.meta.snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(node_type: &str, metadata: Value) -> NodeRecord {
        let mut record = NodeRecord::derived("p1", "node", node_type, None);
        record.id = RecordId(7);
        record.metadata = metadata;
        record
    }

    #[test]
    fn test_derived_provenance_is_parsed() {
        let rec = record("component", json!({ "source_path": "/ws/src/Button.tsx" }));
        let meta = rec.meta();
        assert_eq!(meta.provenance(), Some(&PathBuf::from("/ws/src/Button.tsx")));
        assert!(!meta.is_legacy_file());
    }

    #[test]
    fn test_legacy_marker_is_detected() {
        let rec = record("file", json!({ "workspace_file": true, "source_path": "/ws/a.ts" }));
        assert!(rec.meta().is_legacy_file());
    }

    #[test]
    fn test_non_object_metadata_is_plain_derived() {
        let rec = record("note", json!("free text"));
        assert_eq!(rec.meta(), NodeMeta::Derived(DerivedMeta::default()));
    }

    #[test]
    fn test_malformed_snapshot_is_dropped() {
        let rec = record(
            SERVICE_NODE_TYPE,
            json!({ "workspace_path": "/ws", "snapshot": { "unexpected": 1 }, "status": "stopped" }),
        );
        let service = ServiceNode::from_record(&rec).unwrap();
        assert!(service.snapshot().is_none());
        assert_eq!(service.meta.workspace_path, PathBuf::from("/ws"));
        assert_eq!(service.meta.status, ServiceStatus::Stopped);
    }

    #[test]
    fn test_malformed_service_metadata_still_identifies_service() {
        let rec = record(SERVICE_NODE_TYPE, json!({ "status": 42 }));
        let service = ServiceNode::from_record(&rec).unwrap();
        assert_eq!(service.meta, ServiceMeta::default());
    }

    #[test]
    fn test_service_classified_records_stay_derived() {
        let derived = record("service", json!({ "source_path": "/ws/src/services/api.ts" }));
        assert!(ServiceNode::from_record(&derived).is_none());
        assert_eq!(
            derived.meta().provenance(),
            Some(&PathBuf::from("/ws/src/services/api.ts"))
        );

        let legacy = record("service", json!({ "workspace_file": true }));
        assert!(legacy.meta().is_legacy_file());
    }

    #[test]
    fn test_derived_record_is_not_a_service() {
        let rec = record("component", Value::Null);
        assert!(ServiceNode::from_record(&rec).is_none());
    }
}
