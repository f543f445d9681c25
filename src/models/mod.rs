// src/models/mod.rs

//! Domain models for the export tooling.
//!
//! Snapshots, categories, the typed record views layered over raw records,
//! and configuration.

mod category;
mod config;
mod record;
mod snapshot;

/// An unprocessed JSON mapping as produced by the API client.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

// Re-export all public types
pub use category::Category;
pub use config::{CompareConfig, Config, ExportConfig, LoggingConfig, PathsConfig};
pub use record::{
    Comment, FIRST_EXPORTED_KEY, Message, Multireddit, Profile, RecordView, SITE_ORIGIN, Save,
    Submission, Subreddit, Upvote, record_text,
};
pub use snapshot::{Snapshot, chronological, json_kind};
