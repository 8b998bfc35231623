//! Deterministic canvas layout for a workspace snapshot
//!
//! The layout is a plain grid: one horizontal band per tree depth, siblings
//! spaced by a fixed step from their parent's x. Identical snapshots always
//! produce identical nodes, positions and relationships.
//!
//! Subtrees are not packed: a child is offset from its own parent only, so
//! cousins in adjacent subtrees can share a position.

use serde::{Deserialize, Serialize};

use crate::model::{FileTreeNode, Position, SemanticType};
use crate::record::RecordId;

/// Position of the synthetic root (the workspace folder itself).
pub const ROOT_POSITION: Position = Position::new(400.0, 0.0);

/// x of the first top-level entry.
pub const BASE_X: f64 = 0.0;

/// Horizontal distance between siblings.
pub const H_STEP: f64 = 220.0;

/// Vertical distance between depth bands.
pub const V_STEP: f64 = 140.0;

/// A positioned node produced for one materialization response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub name: String,
    pub node_type: SemanticType,
    pub relative_path: String,
    pub is_file: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasRelationship {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
}

impl CanvasRelationship {
    pub fn contains(source: String, target: String) -> Self {
        CanvasRelationship {
            id: format!("{source}->{target}"),
            source,
            target,
            kind: RelationshipKind::Contains,
        }
    }
}

/// Nodes and containment relationships for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub relationships: Vec<CanvasRelationship>,
}

impl CanvasGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// Canvas id of a snapshot entry; the root maps to `"{service}:/"`.
pub fn canvas_id(service_id: RecordId, relative_path: &str) -> String {
    format!("{service_id}:/{relative_path}")
}

struct Placement<'a> {
    node: &'a FileTreeNode,
    parent_id: String,
    depth: usize,
    position: Position,
}

/// Expand a snapshot into positioned canvas nodes, emitted in pre-order.
pub fn layout_snapshot(service_id: RecordId, tree: &FileTreeNode) -> CanvasGraph {
    let mut graph = CanvasGraph::default();

    let root_id = canvas_id(service_id, &tree.relative_path);
    graph.nodes.push(canvas_node(root_id.clone(), tree, ROOT_POSITION));

    let mut stack = Vec::new();
    push_children(&mut stack, tree, &root_id, BASE_X, 1);

    while let Some(placement) = stack.pop() {
        let id = canvas_id(service_id, &placement.node.relative_path);
        graph
            .nodes
            .push(canvas_node(id.clone(), placement.node, placement.position));
        graph
            .relationships
            .push(CanvasRelationship::contains(placement.parent_id, id.clone()));

        push_children(
            &mut stack,
            placement.node,
            &id,
            placement.position.x,
            placement.depth + 1,
        );
    }

    graph
}

/// Queue children in reverse so they pop in sibling order.
fn push_children<'a>(
    stack: &mut Vec<Placement<'a>>,
    parent: &'a FileTreeNode,
    parent_id: &str,
    origin_x: f64,
    depth: usize,
) {
    for (index, child) in parent.children.iter().enumerate().rev() {
        stack.push(Placement {
            node: child,
            parent_id: parent_id.to_string(),
            depth,
            position: Position::new(origin_x + index as f64 * H_STEP, depth as f64 * V_STEP),
        });
    }
}

fn canvas_node(id: String, node: &FileTreeNode, position: Position) -> CanvasNode {
    CanvasNode {
        id,
        name: node.name.clone(),
        node_type: node.node_type,
        relative_path: node.relative_path.clone(),
        is_file: node.is_file(),
        position,
    }
}
