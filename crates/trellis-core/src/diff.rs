//! Snapshot diff computation for incremental syncs

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::FileTreeNode;

/// Paths that appeared or disappeared between two snapshots of a workspace.
///
/// Renames are not tracked: a renamed entry shows up once in `removed` under
/// its old path and once in `added` under the new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Absolute paths present in the old snapshot but not in the new one.
    pub removed: BTreeSet<PathBuf>,
    /// Absolute paths present in the new snapshot but not in the old one.
    pub added: BTreeSet<PathBuf>,
}

impl SnapshotDiff {
    /// Compare a previous snapshot (if any) against a freshly scanned tree.
    pub fn compute(old: Option<&FileTreeNode>, new: &FileTreeNode) -> Self {
        let old_paths = old.map(collect_paths).unwrap_or_default();
        let new_paths = collect_paths(new);

        let removed = difference(&old_paths, &new_paths);
        let added = difference(&new_paths, &old_paths);

        SnapshotDiff { removed, added }
    }

    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Absolute paths present in `old` but absent from `new`.
pub fn removed_paths(old: Option<&FileTreeNode>, new: &FileTreeNode) -> BTreeSet<PathBuf> {
    SnapshotDiff::compute(old, new).removed
}

/// Every absolute path in the tree, root included.
pub fn collect_paths(tree: &FileTreeNode) -> HashSet<&Path> {
    tree.iter().map(|n| n.path.as_path()).collect()
}

fn difference(left: &HashSet<&Path>, right: &HashSet<&Path>) -> BTreeSet<PathBuf> {
    left.difference(right).map(|p| p.to_path_buf()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SemanticType;

    fn folder(rel: &str, children: Vec<FileTreeNode>) -> FileTreeNode {
        let mut node = FileTreeNode::folder(
            rel.rsplit('/').next().unwrap_or(rel).to_string(),
            PathBuf::from("/ws").join(rel),
            rel.to_string(),
            SemanticType::Folder,
        );
        node.children = children;
        node
    }

    fn file(rel: &str) -> FileTreeNode {
        FileTreeNode::file(
            rel.rsplit('/').next().unwrap_or(rel).to_string(),
            PathBuf::from("/ws").join(rel),
            rel.to_string(),
            SemanticType::File,
            1,
        )
    }

    #[test]
    fn test_no_previous_snapshot_removes_nothing() {
        let new = folder("", vec![file("a.ts")]);
        let diff = SnapshotDiff::compute(None, &new);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.added.len(), 2);
    }

    #[test]
    fn test_identical_snapshots_are_empty() {
        let tree = folder("", vec![folder("src", vec![file("src/a.ts")])]);
        assert!(SnapshotDiff::compute(Some(&tree), &tree.clone()).is_empty());
    }

    #[test]
    fn test_removed_folder_reports_descendants() {
        let old = folder(
            "",
            vec![
                folder("lib", vec![file("lib/x.rs"), file("lib/y.rs")]),
                file("main.rs"),
            ],
        );
        let new = folder("", vec![file("main.rs")]);

        let removed = removed_paths(Some(&old), &new);
        let expected: BTreeSet<PathBuf> = ["/ws/lib", "/ws/lib/x.rs", "/ws/lib/y.rs"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(removed, expected);
    }

    #[test]
    fn test_rename_is_delete_plus_create() {
        let old = folder("", vec![file("old.ts")]);
        let new = folder("", vec![file("new.ts")]);

        let diff = SnapshotDiff::compute(Some(&old), &new);
        assert!(diff.removed.contains(Path::new("/ws/old.ts")));
        assert!(diff.added.contains(Path::new("/ws/new.ts")));
    }
}
