//! Pinned-apps configuration store.
//!
//! One pretty-printed JSON file, `{"apps": [...]}`, read and written whole.
//! Reads never fail (absent or corrupt reads as empty). Writes go through a
//! sibling temp file and a rename so a reader never sees a half-written file,
//! and write errors are returned to the caller.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

pub const PINNED_APPS_FILE: &str = "pinned_apps.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode pinned apps: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PinnedAppsFile {
    #[serde(default)]
    apps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PinnedAppsStore {
    path: PathBuf,
}

impl PinnedAppsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PINNED_APPS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty list if nothing is stored yet. An existing file is left
    /// untouched, even if corrupt.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        self.write(&[])
    }

    pub fn read(&self) -> Vec<String> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    component = "store",
                    event = "store.read_failed",
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read pinned apps"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<PinnedAppsFile>(data.trim_start_matches('\u{feff}')) {
            Ok(file) => file.apps,
            Err(e) => {
                warn!(
                    component = "store",
                    event = "store.parse_failed",
                    path = %self.path.display(),
                    error = %e,
                    "Pinned apps file is corrupt, treating as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn write(&self, apps: &[String]) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(&PinnedAppsFile {
            apps: apps.to_vec(),
        })?;

        self.write_atomic(body.as_bytes()).map_err(|source| {
            error!(
                component = "store",
                event = "store.write_failed",
                path = %self.path.display(),
                error = %source,
                "Failed to write pinned apps"
            );
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self
            .path
            .with_file_name(format!("{PINNED_APPS_FILE}.{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path).inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }
}
