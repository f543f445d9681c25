// src/error.rs

//! Unified error handling for the export tooling.

use std::fmt;

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Both `body` and `selftext` are set on the same record
    #[error("Record {id} has both body and selftext set")]
    AmbiguousTextFields { id: String },

    /// A field required by an accessor is absent
    #[error("Missing field '{field}'")]
    MissingField { field: String },

    /// A field is present but has an unexpected shape
    #[error("Malformed record field '{field}': {message}")]
    MalformedRecord { field: String, message: String },

    /// Two snapshots hold incompatible container types at the same path
    #[error("Type mismatch at '{path}': {left} vs {right}")]
    TypeMismatch {
        path: String,
        left: &'static str,
        right: &'static str,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a malformed record error with context.
    pub fn malformed(field: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            field: field.into(),
            message: message.to_string(),
        }
    }
}
