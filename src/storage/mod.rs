//! Storage abstractions for export snapshots.
//!
//! Snapshots are immutable JSON files whose names carry the capture time:
//!
//! ```text
//! {root}/
//! ├── config.toml
//! ├── reddit-20240101T090000Z.json
//! ├── reddit-20240108T090000Z.json
//! └── reddit-20240115T090000Z.json
//! ```
//!
//! Listing order is capture order, oldest first.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// A stored snapshot that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    /// File name inside the storage root
    pub name: String,
    /// Capture time parsed from the name, if it carries a stamp
    pub captured_at: Option<DateTime<Utc>>,
}

/// Result of offering a new export to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The export was persisted under `name`
    Written { name: String },
    /// The export matched `redundant_with` and was discarded
    Skipped { redundant_with: String },
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// List stored snapshots, oldest first.
    async fn list(&self) -> Result<Vec<SnapshotRef>>;

    /// Read and decode a single snapshot.
    async fn load(&self, snapshot: &SnapshotRef) -> Result<Snapshot>;

    /// Read every snapshot, oldest first.
    async fn load_all(&self) -> Result<Vec<Snapshot>>;

    /// Read the most recent snapshot, if any.
    async fn latest(&self) -> Result<Option<Snapshot>> {
        match self.list().await?.pop() {
            Some(newest) => Ok(Some(self.load(&newest).await?)),
            None => Ok(None),
        }
    }

    /// Persist a new export captured at `captured_at`.
    async fn write(&self, document: &Value, captured_at: DateTime<Utc>) -> Result<String>;
}
