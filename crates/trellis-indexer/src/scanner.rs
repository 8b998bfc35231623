//! Workspace directory scanner
//!
//! Walks a workspace with an explicit work stack and builds a classified
//! [`FileTreeNode`] tree. Only a missing or unreadable root is an error;
//! anything unreadable below it is logged and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use trellis_core::FileTreeNode;

use crate::classify::{classify_file, classify_folder, is_service_folder};

/// Directories never descended into: build output, dependency caches, VCS
/// metadata, virtual environments.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "target",
    "out",
    ".next",
    ".nuxt",
    ".turbo",
    ".cache",
    "coverage",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".venv",
    "venv",
    ".gradle",
    ".idea",
];

/// OS artifacts.
pub const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

const IGNORED_DIR_GLOBS: &[&str] = &["*.egg-info"];

const IGNORED_FILE_GLOBS: &[&str] = &["*.pyc", "*.swp"];

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("workspace not found: {0}")]
    NotFound(PathBuf),

    #[error("workspace is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read workspace root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern: {0}")]
    InvalidPattern(#[from] globset::Error),
}

/// Scanner settings on top of the built-in deny-lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Extra globs matched against entry names and workspace-relative paths.
    pub extra_ignores: Vec<String>,
    /// Folders at this depth or deeper are listed but not descended.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            extra_ignores: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub folders: usize,
    pub files: usize,
    /// Entries dropped by a deny-list.
    pub ignored: usize,
    /// Entries that could not be read.
    pub skipped: usize,
}

/// Result of a scan.
#[derive(Debug, Clone)]
pub struct Scan {
    pub tree: FileTreeNode,
    pub stats: ScanStats,
}

/// Slot in the flat arena the walk fills before the tree is assembled.
/// `parent: None` means the workspace root.
struct Slot {
    node: Option<FileTreeNode>,
    parent: Option<usize>,
}

/// A directory waiting to be listed; `slot: None` is the root itself.
struct PendingDir {
    slot: Option<usize>,
    path: PathBuf,
    relative_path: String,
    depth: usize,
}

pub struct Scanner {
    dir_globs: GlobSet,
    file_globs: GlobSet,
    max_depth: usize,
}

impl Scanner {
    pub fn new(options: &ScanOptions) -> Result<Self, ScanError> {
        Ok(Scanner {
            dir_globs: build_globset(IGNORED_DIR_GLOBS, &options.extra_ignores)?,
            file_globs: build_globset(IGNORED_FILE_GLOBS, &options.extra_ignores)?,
            max_depth: options.max_depth,
        })
    }

    /// Scan `root` into a classified tree.
    pub fn scan(&self, root: &Path) -> Result<Scan, ScanError> {
        let root = resolve_root(root)?;
        let name = workspace_name(&root);

        let mut root_node =
            FileTreeNode::folder(name.clone(), root.clone(), String::new(), classify_folder(&name));
        root_node.service = is_service_folder(&name);

        let mut stats = ScanStats {
            folders: 1,
            ..ScanStats::default()
        };
        let mut slots: Vec<Slot> = Vec::new();
        let mut stack = vec![PendingDir {
            slot: None,
            path: root.clone(),
            relative_path: String::new(),
            depth: 0,
        }];

        while let Some(dir) = stack.pop() {
            debug!("Processing directory: {}", dir.path.display());

            let entries = match fs::read_dir(&dir.path) {
                Ok(entries) => entries,
                Err(e) if dir.slot.is_none() => {
                    return Err(ScanError::RootUnreadable {
                        path: dir.path,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Cannot read directory {}: {}", dir.path.display(), e);
                    stats.skipped += 1;
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Cannot read entry in {}: {}", dir.path.display(), e);
                        stats.skipped += 1;
                        continue;
                    }
                };

                let path = entry.path();
                let name = entry.file_name().to_string_lossy().into_owned();
                let relative_path = if dir.relative_path.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", dir.relative_path, name)
                };

                let Some(kind) = self.entry_kind(&entry, &path, &mut stats) else {
                    continue;
                };

                match kind {
                    Kind::Dir => {
                        if self.is_ignored_dir(&name, &relative_path) {
                            debug!("Skipping ignored directory {}", relative_path);
                            stats.ignored += 1;
                            continue;
                        }

                        let mut node = FileTreeNode::folder(
                            name.clone(),
                            path.clone(),
                            relative_path.clone(),
                            classify_folder(&name),
                        );
                        node.service = is_service_folder(&name);
                        stats.folders += 1;

                        slots.push(Slot {
                            node: Some(node),
                            parent: dir.slot,
                        });

                        let depth = dir.depth + 1;
                        if depth >= self.max_depth {
                            warn!(
                                "Not descending into {}: depth {} reaches limit {}",
                                relative_path, depth, self.max_depth
                            );
                            continue;
                        }
                        stack.push(PendingDir {
                            slot: Some(slots.len() - 1),
                            path,
                            relative_path,
                            depth,
                        });
                    }
                    Kind::File(size) => {
                        if self.is_ignored_file(&name, &relative_path) {
                            stats.ignored += 1;
                            continue;
                        }

                        let node_type = classify_file(&name, &dir.relative_path);
                        stats.files += 1;
                        slots.push(Slot {
                            node: Some(FileTreeNode::file(name, path, relative_path, node_type, size)),
                            parent: dir.slot,
                        });
                    }
                }
            }
        }

        let tree = assemble(root_node, slots);
        info!(
            "Scanned {}: {} folders, {} files ({} ignored, {} unreadable)",
            root.display(),
            stats.folders,
            stats.files,
            stats.ignored,
            stats.skipped
        );
        Ok(Scan { tree, stats })
    }

    /// Directory, regular file (with size), or `None` for anything skipped.
    /// Symlinked files are followed; symlinked directories are not, which
    /// keeps the tree acyclic.
    fn entry_kind(&self, entry: &fs::DirEntry, path: &Path, stats: &mut ScanStats) -> Option<Kind> {
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                stats.skipped += 1;
                return None;
            }
        };

        if file_type.is_dir() {
            return Some(Kind::Dir);
        }

        let metadata = if file_type.is_symlink() {
            fs::metadata(path)
        } else {
            entry.metadata()
        };
        match metadata {
            Ok(meta) if meta.is_file() => Some(Kind::File(meta.len())),
            Ok(meta) if meta.is_dir() => {
                debug!("Skipping symlinked directory {}", path.display());
                stats.ignored += 1;
                None
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                stats.skipped += 1;
                None
            }
        }
    }

    fn is_ignored_dir(&self, name: &str, relative_path: &str) -> bool {
        IGNORED_DIRS.contains(&name)
            || self.dir_globs.is_match(name)
            || self.dir_globs.is_match(relative_path)
    }

    fn is_ignored_file(&self, name: &str, relative_path: &str) -> bool {
        IGNORED_FILES.contains(&name)
            || self.file_globs.is_match(name)
            || self.file_globs.is_match(relative_path)
    }
}

enum Kind {
    Dir,
    File(u64),
}

/// Name a workspace is known by: the last component of its resolved root.
pub fn workspace_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("root")
        .to_string()
}

fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        Err(e) => {
            return Err(ScanError::RootUnreadable {
                path: root.to_path_buf(),
                source: e,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    root.canonicalize().map_err(|e| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source: e,
    })
}

fn build_globset(builtin: &[&str], extra: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in builtin.iter().copied().chain(extra.iter().map(String::as_str)) {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Fold the arena back into a tree. A child's slot always comes after its
/// parent's, so walking backwards finishes every subtree before it is moved.
fn assemble(mut root: FileTreeNode, mut slots: Vec<Slot>) -> FileTreeNode {
    for index in (0..slots.len()).rev() {
        let Some(mut node) = slots[index].node.take() else {
            continue;
        };
        node.sort_children();
        let parent = slots[index].parent;
        match parent.and_then(|p| slots[p].node.as_mut()) {
            Some(parent) => parent.children.push(node),
            None => root.children.push(node),
        }
    }

    root.sort_children();
    root
}
