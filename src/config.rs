//! Configuration loading: optional TOML file, environment, then CLI flags

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trellis_core::TableStore;
use trellis_indexer::ScanOptions;
use trellis_server::ServerConfig;

/// Config file picked up from the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "trellis.toml";

/// Environment variable (also read from `.env`) overriding `store_dir`.
pub const STORE_DIR_ENV: &str = "TRELLIS_STORE_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `.trellis/graph.json`; the working directory if unset.
    pub store_dir: Option<PathBuf>,
    pub scan: ScanOptions,
    pub server: ServerConfig,
}

impl Config {
    /// Load `path`, or `trellis.toml` if present, or defaults; then apply
    /// `TRELLIS_STORE_DIR`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
            if !dir.is_empty() {
                config.store_dir = Some(PathBuf::from(dir));
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn store_root(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn open_store(&self) -> anyhow::Result<TableStore> {
        let root = self.store_root();
        TableStore::open(&root)
            .with_context(|| format!("Failed to open graph store in {}", root.display()))
    }
}
