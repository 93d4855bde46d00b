//! Catalog backup snapshots and retention.
//!
//! One file per backup, named `catalog-YYYYMMDD-HHMMSSmmm.json`. Millisecond
//! precision keeps two runs within the same second from colliding. Retention
//! keeps the newest N files by modification time.

use std::path::{Path, PathBuf};

use crate::store::CatalogError;

/// Manages timestamped copies of the catalog file.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy the current catalog file into the backup directory.
    ///
    /// Returns the backup path, or `None` when there is no catalog file yet
    /// (first run, nothing to protect). Any other failure is an error: the
    /// merge must not proceed without a recovery point.
    pub fn snapshot(&self, catalog_path: &Path) -> Result<Option<PathBuf>, CatalogError> {
        if !catalog_path.exists() {
            log::info!(
                "No catalog at {} yet; skipping backup",
                catalog_path.display()
            );
            return Ok(None);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))?;

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        let backup_path = self.dir.join(format!("catalog-{stamp}.json"));
        std::fs::copy(catalog_path, &backup_path)
            .map_err(|e| CatalogError::io(&backup_path, e))?;

        log::info!("Catalog backed up to {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// List backup files, newest first by modification time.
    pub fn list(&self) -> Result<Vec<PathBuf>, CatalogError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        let dir_iter = std::fs::read_dir(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))?;
        for entry in dir_iter.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("catalog-") && n.ends_with(".json"));
            if !is_backup {
                continue;
            }
            let mtime = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            entries.push((path, mtime));
        }

        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(entries.into_iter().map(|(p, _)| p).collect())
    }

    /// Delete the oldest backups until at most `retention` remain.
    ///
    /// Failures here are logged, not fatal: the merge has already committed
    /// and a surplus of backups is harmless.
    pub fn prune(&self) {
        let backups = match self.list() {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Could not list backups for retention: {}", e);
                return;
            }
        };

        for old in backups.iter().skip(self.retention) {
            match std::fs::remove_file(old) {
                Ok(()) => log::info!("Pruned old backup {}", old.display()),
                Err(e) => log::warn!("Could not prune backup {}: {}", old.display(), e),
            }
        }
    }
}
