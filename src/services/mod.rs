//! Service layer for the export tooling.
//!
//! This module contains the read side used by reports and backups:
//! - Merged typed access to all snapshots (`Dal`)

mod dal;

pub use dal::Dal;
