//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use trellis_core::{GraphStore, RecordId};
use trellis_indexer::Scanner;
use trellis_server::{ServerState, TrellisServer};
use trellis_sync::{Materializer, Reconciler};

use crate::config::Config;

/// Summary printed by `sync`; the scanned tree is left out.
#[derive(Serialize)]
struct SyncReport<'a> {
    service_id: RecordId,
    created: usize,
    updated: usize,
    removed: usize,
    files: usize,
    added_paths: &'a [std::path::PathBuf],
    removed_paths: &'a [std::path::PathBuf],
}

pub fn sync(config: &Config, project: &str, workspace: &Path) -> anyhow::Result<()> {
    let store = config.open_store()?;
    let scanner = Scanner::new(&config.scan)?;

    let summary = Reconciler::new(&store, &scanner).sync(project, workspace)?;

    print_json(&SyncReport {
        service_id: summary.service_id,
        created: summary.created,
        updated: summary.updated,
        removed: summary.removed,
        files: summary.tree.file_count(),
        added_paths: &summary.added_paths,
        removed_paths: &summary.removed_paths,
    })
}

pub fn tree(config: &Config, workspace: &Path) -> anyhow::Result<()> {
    let scan = Scanner::new(&config.scan)?.scan(workspace)?;
    print_json(&scan.tree)
}

pub fn canvas(config: &Config, service_id: u64) -> anyhow::Result<()> {
    let store = config.open_store()?;
    let graph = Materializer::new(&store).materialize(RecordId(service_id))?;

    if graph.is_empty() {
        tracing::warn!("Service {} has no synced snapshot", service_id);
    }
    print_json(&graph)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting Trellis server on {}:{}", config.server.host, config.server.port);

    let store: Arc<dyn GraphStore> = Arc::new(config.open_store()?);
    let scanner = Scanner::new(&config.scan)?;

    let server = TrellisServer::new(ServerState::new(store, scanner), config.server);
    server.start().await
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
