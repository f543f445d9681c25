//! Local filesystem storage implementation.
//!
//! Snapshot files are read concurrently, bounded by
//! `export.max_concurrent_reads`, and handed back in capture order no matter
//! which read finishes first. Writes go to a temporary file that is linked
//! into place, so a half-written export is never listed and an existing one is
//! never replaced.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Config, Snapshot};
use crate::storage::{SnapshotRef, SnapshotStorage};
use crate::utils::{format_stamp, parse_stamp};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file_prefix: String,
    max_concurrent_reads: usize,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(root_dir, &Config::default())
    }

    /// Create a LocalStorage using naming and concurrency from `config`.
    pub fn with_config(root_dir: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_prefix: config.paths.file_prefix.clone(),
            max_concurrent_reads: config.export.max_concurrent_reads.max(1),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// File name for an export captured at `captured_at`.
    fn snapshot_name(&self, captured_at: DateTime<Utc>) -> String {
        format!("{}-{}.json", self.file_prefix, format_stamp(captured_at))
    }

    fn is_snapshot_name(&self, name: &str) -> bool {
        name.starts_with(&self.file_prefix) && name.ends_with(".json")
    }

    /// Write bytes atomically without replacing an existing file.
    ///
    /// The data goes to a temp file first, which is then hard-linked into
    /// place. Linking fails if the target already exists. The temp file is
    /// removed whatever the outcome.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = path.with_extension("tmp");
        let result = match Self::write_tmp(&tmp, bytes).await {
            Ok(()) => tokio::fs::hard_link(&tmp, &path).await,
            Err(e) => Err(e),
        };
        match tokio::fs::remove_file(&tmp).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                log::warn!("Failed to remove {}: {}", tmp.display(), e);
            }
            _ => {}
        }

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AppError::storage(format!("Snapshot {key} already exists")))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_tmp(tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn list(&self) -> Result<Vec<SnapshotRef>> {
        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Storage directory {} not found", self.root_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut refs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.is_snapshot_name(&name) || !entry.file_type().await?.is_file() {
                continue;
            }
            refs.push(SnapshotRef {
                captured_at: parse_stamp(&name),
                name,
            });
        }

        refs.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(refs)
    }

    async fn load(&self, snapshot: &SnapshotRef) -> Result<Snapshot> {
        let bytes = self
            .read_bytes(&snapshot.name)
            .await?
            .ok_or_else(|| AppError::storage(format!("Snapshot {} vanished", snapshot.name)))?;
        let document: Value = serde_json::from_slice(&bytes)?;
        Ok(Snapshot::new(snapshot.name.clone(), document))
    }

    async fn load_all(&self) -> Result<Vec<Snapshot>> {
        let refs = self.list().await?;
        log::debug!(
            "Loading {} snapshots from {} ({} at a time)",
            refs.len(),
            self.root_dir.display(),
            self.max_concurrent_reads
        );

        // `buffered` yields in input order, keeping the oldest-first sequence.
        stream::iter(refs)
            .map(|snapshot| async move { self.load(&snapshot).await })
            .buffered(self.max_concurrent_reads)
            .try_collect()
            .await
    }

    async fn write(&self, document: &Value, captured_at: DateTime<Utc>) -> Result<String> {
        let name = self.snapshot_name(captured_at);
        if tokio::fs::try_exists(self.path(&name)).await? {
            return Err(AppError::storage(format!("Snapshot {name} already exists")));
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        self.write_bytes(&name, &bytes).await?;
        log::info!("Snapshot written to {}", self.path(&name).display());
        Ok(name)
    }
}
