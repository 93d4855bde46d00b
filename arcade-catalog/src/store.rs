//! JSON catalog store.
//!
//! The catalog is a single JSON document: `{"generatedAt": ..., "games": [...]}`.
//! Reads degrade to an empty catalog when the file is absent or corrupt so a
//! first-time (or recovering) run can proceed; writes go through a temp file
//! in the same directory followed by an atomic rename, so a failed write
//! never leaves a partially serialized catalog on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::GameRecord;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// On-disk document wrapper around the record list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    generated_at: String,
    games: Vec<GameRecord>,
}

/// Reads and writes the persisted catalog document.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records from the catalog file.
    ///
    /// A missing or unparseable file yields an empty catalog with a warning;
    /// the run then proceeds as a first-time ingestion.
    pub fn load(&self) -> Vec<GameRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "Catalog file {} not found; starting with an empty catalog",
                    self.path.display()
                );
                return Vec::new();
            }
            Err(e) => {
                log::warn!(
                    "Could not read catalog file {}: {}; starting with an empty catalog",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<CatalogDocument>(&contents) {
            Ok(doc) => doc.games,
            Err(e) => {
                log::warn!(
                    "Catalog file {} is corrupt ({}); starting with an empty catalog",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Atomically replace the catalog file with the given records.
    ///
    /// Serialization and the temp-file write both happen before the rename,
    /// so any failure leaves the previous catalog untouched.
    pub fn save(&self, records: &[GameRecord]) -> Result<(), CatalogError> {
        let doc = CatalogDocument {
            generated_at: chrono::Utc::now().to_rfc3339(),
            games: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|e| CatalogError::Json {
            path: self.path.display().to_string(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| CatalogError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            // Leave no temp litter behind on a failed rename.
            let _ = std::fs::remove_file(&tmp_path);
            CatalogError::io(&self.path, e)
        })?;

        Ok(())
    }
}
