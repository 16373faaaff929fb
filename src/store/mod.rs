// src/store/mod.rs
// =============================================================================
// JSON-file persistence for everything the crawler remembers between runs.
//
// Submodules:
// - sites: the site registry (molt_sites_db.json)
// - exclusions: known false positives (excluded_sites.json)
// - audit: the curation audit log (audit_log.json)
// - leads: lead sources and aggregator featured lists (lead_sources.json)
//
// Files are read once when a command starts and written once when it ends.
// A file that is missing or corrupt is replaced by an empty default: the
// run continues without history instead of failing.
// =============================================================================

mod audit;
mod exclusions;
mod leads;
mod sites;

pub use audit::{AuditEntry, AuditLog};
pub use exclusions::{ExclusionRecord, ExclusionRegistry};
pub use leads::LeadConfig;
pub use sites::{SiteRecord, SiteRegistry, Source, Trust, Visit};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while persisting a store. Loading never fails.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Where each store lives inside the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub registry: PathBuf,
    pub exclusions: PathBuf,
    pub audit_log: PathBuf,
    pub lead_sources: PathBuf,
    pub audit_csv: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            registry: data_dir.join("molt_sites_db.json"),
            exclusions: data_dir.join("excluded_sites.json"),
            audit_log: data_dir.join("audit_log.json"),
            lead_sources: data_dir.join("lead_sources.json"),
            audit_csv: data_dir.join("audit_queue.csv"),
        }
    }
}

// Reads a JSON store, falling back to T::default() on any problem
pub(crate) fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "store not found, starting empty");
            return T::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable store, starting empty");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt store, starting empty");
            T::default()
        }
    }
}

// Creates the directory a store file lives in
pub(crate) fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

// Writes a store as pretty-printed JSON, creating the directory if needed
pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent(path)?;

    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json + "\n").map_err(io_err)
}
