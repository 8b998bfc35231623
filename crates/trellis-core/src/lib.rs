//! Trellis Core — file tree model, snapshot diff, graph store port and canvas layout

pub mod model;
pub mod diff;
pub mod record;
pub mod store;
pub mod canvas;


pub use model::{TreeNodeId, EntryKind, SemanticType, Language, FileTreeNode, Position, sibling_order};
pub use diff::{SnapshotDiff, removed_paths, collect_paths};
pub use record::{
    RecordId, NodeRecord, RelationshipRecord, NodeMeta, DerivedMeta, ServiceMeta, ServiceNode,
    ServiceStatus, SERVICE_NODE_TYPE, PROVENANCE_KEY, LEGACY_FILE_MARKER,
};
pub use store::{GraphStore, TableStore, StoreError, STORE_DIR, GRAPH_FILE, store_dir, graph_file_path, delete_nodes_cascading};
pub use canvas::{CanvasGraph, CanvasNode, CanvasRelationship, RelationshipKind, layout_snapshot, canvas_id};
