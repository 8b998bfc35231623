//! Test fixtures for sync: workspaces on disk and a store that fails on demand

use std::fs;
use tempfile::TempDir;
use trellis_core::{GraphStore, NodeRecord, RecordId, RelationshipRecord, StoreError, TableStore};

/// Create a temporary workspace with the given `(relative path, content)` files.
pub fn create_workspace(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// Three-file web app workspace.
pub fn create_web_app() -> TempDir {
    create_workspace(&[
        ("src/index.ts", "import './components/Button';\n"),
        ("src/components/Button.tsx", "export const Button = () => null;\n"),
        ("package.json", "{ \"name\": \"web\" }\n"),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Insert,
    Update,
    Delete,
    Flush,
}

/// A [`TableStore`] whose chosen operation always fails.
pub struct FailingStore {
    pub inner: TableStore,
    pub fail_on: FailOn,
}

impl FailingStore {
    pub fn new(fail_on: FailOn) -> Self {
        FailingStore {
            inner: TableStore::in_memory(),
            fail_on,
        }
    }

    fn check(&self, op: FailOn) -> Result<(), StoreError> {
        if self.fail_on == op {
            return Err(StoreError::Backend(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl GraphStore for FailingStore {
    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError> {
        self.inner.nodes()
    }

    fn relationships(&self) -> Result<Vec<RelationshipRecord>, StoreError> {
        self.inner.relationships()
    }

    fn insert_node(&self, node: NodeRecord) -> Result<RecordId, StoreError> {
        self.check(FailOn::Insert)?;
        self.inner.insert_node(node)
    }

    fn insert_relationship(&self, relationship: RelationshipRecord) -> Result<RecordId, StoreError> {
        self.check(FailOn::Insert)?;
        self.inner.insert_relationship(relationship)
    }

    fn update_node(&self, node: NodeRecord) -> Result<(), StoreError> {
        self.check(FailOn::Update)?;
        self.inner.update_node(node)
    }

    fn delete_node(&self, id: RecordId) -> Result<bool, StoreError> {
        self.check(FailOn::Delete)?;
        self.inner.delete_node(id)
    }

    fn delete_relationship(&self, id: RecordId) -> Result<bool, StoreError> {
        self.check(FailOn::Delete)?;
        self.inner.delete_relationship(id)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.check(FailOn::Flush)?;
        self.inner.flush()
    }
}
