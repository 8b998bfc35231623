//! Integration tests for Trellis
//!
//! These tests drive the scanner, reconciler, store and materializer together,
//! and the CLI binary end to end.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;
use trellis_core::{
    graph_file_path, GraphStore, NodeRecord, RelationshipRecord, SemanticType, TableStore,
};
use trellis_indexer::{ScanOptions, Scanner};
use trellis_sync::{Materializer, Reconciler};

fn create_workspace(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in structure {
        let full_path = temp_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }
    temp_dir
}

fn trellis(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(args)
        .current_dir(cwd)
        .env_remove("TRELLIS_STORE_DIR")
        .output()
        .expect("Failed to execute trellis")
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let cwd = TempDir::new().unwrap();
    let output = trellis(cwd.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("trellis"));
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("canvas"));
}

#[test]
fn test_cli_sync_then_canvas() {
    let workspace = create_workspace(&[
        ("src/index.ts", ""),
        ("src/components/Button.tsx", ""),
        ("node_modules/pkg/index.js", ""),
    ]);
    let store_dir = TempDir::new().unwrap();
    let store_arg = store_dir.path().to_str().unwrap();
    let workspace_arg = workspace.path().to_str().unwrap();

    let output = trellis(store_dir.path(), &["--store-dir", store_arg, "sync", "p1", workspace_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["created"], 1);
    assert_eq!(report["updated"], 0);
    assert_eq!(report["files"], 2);
    assert!(graph_file_path(store_dir.path()).exists());

    let service_id = report["service_id"].as_u64().unwrap().to_string();
    let output = trellis(store_dir.path(), &["--store-dir", store_arg, "canvas", &service_id]);
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(graph["relationships"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_sync_missing_workspace_fails() {
    let store_dir = TempDir::new().unwrap();
    let store_arg = store_dir.path().to_str().unwrap();
    let missing = store_dir.path().join("missing");

    let output = trellis(
        store_dir.path(),
        &["--store-dir", store_arg, "sync", "p1", missing.to_str().unwrap()],
    );

    assert!(!output.status.success());
    assert!(!graph_file_path(store_dir.path()).exists());
}

#[test]
fn test_cli_tree_honours_config_ignores() {
    let workspace = create_workspace(&[("src/app.py", ""), ("fixtures/big.json", "")]);
    let config_dir = TempDir::new().unwrap();
    fs::write(
        config_dir.path().join("trellis.toml"),
        "[scan]\nextra_ignores = [\"fixtures\"]\n",
    )
    .unwrap();

    let output = trellis(config_dir.path(), &["tree", workspace.path().to_str().unwrap()]);
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = tree["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["src"]);
}

/// Sync, reopen the store from disk, delete a file and sync again.
#[test]
fn test_sync_survives_store_reopen() {
    let workspace = create_workspace(&[
        ("src/index.ts", ""),
        ("src/components/Button.tsx", ""),
        ("README.md", "# web"),
    ]);
    let store_dir = TempDir::new().unwrap();
    let scanner = Scanner::new(&ScanOptions::default()).unwrap();

    let first = {
        let store = TableStore::open(store_dir.path()).unwrap();
        let summary = Reconciler::new(&store, &scanner).sync("p1", workspace.path()).unwrap();

        let button = summary.tree.find("src/components/Button.tsx").unwrap();
        assert_eq!(button.node_type, SemanticType::Component);

        let derived = store
            .insert_node(NodeRecord::derived("p1", "Button", "component", Some(button.path.clone())))
            .unwrap();
        store
            .insert_relationship(RelationshipRecord::new("p1", summary.service_id, derived, "contains"))
            .unwrap();
        store.flush().unwrap();
        summary
    };

    let store = TableStore::open(store_dir.path()).unwrap();
    assert_eq!(store.nodes().unwrap().len(), 2);
    assert_eq!(store.relationships().unwrap().len(), 1);

    let canvas = Materializer::new(&store).materialize(first.service_id).unwrap();
    assert_eq!(canvas.nodes.len(), first.tree.iter().count());

    fs::remove_file(workspace.path().join("src/components/Button.tsx")).unwrap();
    let second = Reconciler::new(&store, &scanner).sync("p1", workspace.path()).unwrap();
    assert_eq!(second.service_id, first.service_id);
    assert_eq!((second.created, second.updated, second.removed), (0, 1, 1));

    let reopened = TableStore::open(store_dir.path()).unwrap();
    assert_eq!(reopened.nodes().unwrap().len(), 1);
    assert!(reopened.relationships().unwrap().is_empty());

    let canvas = Materializer::new(&reopened).materialize(first.service_id).unwrap();
    assert!(canvas.nodes.iter().all(|n| n.relative_path != "src/components/Button.tsx"));
    assert_eq!(canvas.nodes.len(), canvas.relationships.len() + 1);
}

/// Test that the server can be assembled over a disk store
#[tokio::test]
async fn test_server_startup() {
    use trellis_server::{ServerConfig, ServerState, TrellisServer};

    let store_dir = TempDir::new().unwrap();
    let store: Arc<dyn GraphStore> = Arc::new(TableStore::open(store_dir.path()).unwrap());
    let scanner = Scanner::new(&ScanOptions::default()).unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0, // Let OS assign port
    };

    let server = TrellisServer::new(ServerState::new(store, scanner), config);
    assert!(server.state().store.nodes().unwrap().is_empty());
}
