//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Snapshot file naming
    #[serde(default)]
    pub paths: PathsConfig,

    /// Snapshot reading behavior
    #[serde(default)]
    pub export: ExportConfig,

    /// Structural comparison settings
    #[serde(default)]
    pub compare: CompareConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let prefix = self.paths.file_prefix.trim();
        if prefix.is_empty() {
            return Err(AppError::validation("paths.file_prefix is empty"));
        }
        if prefix.contains(['/', '\\']) {
            return Err(AppError::validation(
                "paths.file_prefix must not contain path separators",
            ));
        }
        if self.export.max_concurrent_reads == 0 {
            return Err(AppError::validation(
                "export.max_concurrent_reads must be > 0",
            ));
        }
        if let Some(empty) = self
            .compare
            .ignore_suffixes
            .iter()
            .position(|s| s.is_empty())
        {
            return Err(AppError::validation(format!(
                "compare.ignore_suffixes[{empty}] is empty and would ignore everything"
            )));
        }
        Ok(())
    }
}

/// Snapshot naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// File name prefix, followed by the capture stamp
    #[serde(default = "defaults::file_prefix")]
    pub file_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            file_prefix: defaults::file_prefix(),
        }
    }
}

/// Snapshot reading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Maximum number of snapshot files decoded at once
    #[serde(default = "defaults::max_concurrent_reads")]
    pub max_concurrent_reads: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: defaults::max_concurrent_reads(),
        }
    }
}

/// Structural comparison settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Trailing path suffixes whose values never count as a difference
    #[serde(default = "defaults::ignore_suffixes")]
    pub ignore_suffixes: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            ignore_suffixes: defaults::ignore_suffixes(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    pub fn file_prefix() -> String {
        "reddit".into()
    }

    pub fn max_concurrent_reads() -> usize {
        4
    }

    // Counters that change between fetches without any user action
    pub fn ignore_suffixes() -> Vec<String> {
        [
            ".score",
            ".ups",
            ".downs",
            ".upvote_ratio",
            ".num_comments",
            ".num_crossposts",
            ".subscribers",
            ".num_subscribers",
            ".active_user_count",
            ".accounts_active",
            ".link_karma",
            ".comment_karma",
            ".total_karma",
            ".awarder_karma",
            ".awardee_karma",
            ".total_awards_received",
            ".gilded",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [export]
            max_concurrent_reads = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.export.max_concurrent_reads, 8);
        assert_eq!(config.paths.file_prefix, "reddit");
        assert!(config.compare.ignore_suffixes.contains(&".score".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_suffix() {
        let mut config = Config::default();
        config.compare.ignore_suffixes.push(String::new());
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.paths.file_prefix, "reddit");
    }

    #[test]
    fn test_load_or_default_reports_bad_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[export]\nmax_concurrent_reads = \"many\"\n").unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(AppError::Toml(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.export.max_concurrent_reads = 0;
        assert!(config.validate().is_err());
    }
}
