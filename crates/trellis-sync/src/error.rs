//! Errors surfaced by sync and materialization

use thiserror::Error;
use trellis_core::StoreError;
use trellis_indexer::ScanError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("scan failed: {0}")]
    Scan(ScanError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ScanError> for SyncError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NotFound(path) | ScanError::NotADirectory(path) => {
                SyncError::NotFound(format!("workspace {}", path.display()))
            }
            other => SyncError::Scan(other),
        }
    }
}
