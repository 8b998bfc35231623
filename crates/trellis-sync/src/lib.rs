//! Workspace-to-graph synchronization: reconcile scans into the store and
//! materialize stored snapshots for the canvas

pub mod error;
pub mod legacy;
pub mod reconciler;
pub mod materialize;

#[cfg(test)]
pub mod test_utils;


pub use error::{Result, SyncError};
pub use legacy::purge_legacy_file_nodes;
pub use reconciler::{Reconciler, SyncSummary, DEFAULT_SERVICE_POSITION};
pub use materialize::Materializer;
