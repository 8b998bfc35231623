//! Workspace scanning and semantic classification

pub mod classify;
pub mod scanner;

#[cfg(test)]
pub mod test_utils;


pub use classify::{classify_file, classify_folder, is_service_folder};
pub use scanner::{Scan, ScanError, ScanOptions, ScanStats, Scanner, workspace_name, DEFAULT_MAX_DEPTH, IGNORED_DIRS, IGNORED_FILES};
