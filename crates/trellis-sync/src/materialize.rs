//! On-demand expansion of a stored snapshot into a canvas graph
//!
//! Read-only: nothing here writes to the store, so any number of callers may
//! materialize concurrently.

use tracing::debug;
use trellis_core::{CanvasGraph, GraphStore, RecordId, ServiceNode, layout_snapshot};

use crate::error::Result;

pub struct Materializer<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Materializer { store }
    }

    /// Canvas nodes and `contains` relationships for a synced service.
    ///
    /// A missing service, a non-service node or a missing snapshot yields an
    /// empty graph: "not synced yet" is not an error.
    pub fn materialize(&self, service_id: RecordId) -> Result<CanvasGraph> {
        let Some(record) = self.store.node(service_id)? else {
            debug!("No node {} to materialize", service_id);
            return Ok(CanvasGraph::default());
        };

        let Some(service) = ServiceNode::from_record(&record) else {
            debug!("Node {} is not a service node", service_id);
            return Ok(CanvasGraph::default());
        };

        match service.snapshot() {
            Some(tree) => Ok(layout_snapshot(service.id, tree)),
            None => {
                debug!("Service {} has no snapshot yet", service_id);
                Ok(CanvasGraph::default())
            }
        }
    }
}
