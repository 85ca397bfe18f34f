//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod predict;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use doctype_core::models::config::DoctypeConfig;
use doctype_core::{ClassificationResult, StatsStore};

/// `<config dir>/doctype/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("doctype")
        .join("config.json")
}

/// The `-c` file, else the default file if it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DoctypeConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!("No config file, using defaults");
                return Ok(DoctypeConfig::default());
            }
            path
        }
    };

    DoctypeConfig::from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Case-insensitive `.pdf` extension check.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Record a successful prediction; a stats failure never fails the command.
pub fn record_stats(store: &StatsStore, path: &Path, result: &ClassificationResult) {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let now = chrono::Local::now().naive_local();

    if let Err(e) = store.record(&filename, result, now) {
        warn!("Failed to update stats at {}: {}", store.path().display(), e);
    }
}
