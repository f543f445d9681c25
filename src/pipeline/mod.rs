//! Reconciliation steps over export snapshots.
//!
//! - `accumulate`: merge one category across snapshots, first seen wins
//! - `first_exported`: infer when each record first appeared
//! - `compare`: structural equality ignoring volatile fields
//! - `diff`: identity-level added/removed summary
//! - `ingest`: annotate, compare and persist a fresh export

pub mod accumulate;
pub mod compare;
pub mod diff;
pub mod first_exported;
pub mod ingest;

pub use accumulate::{Accumulator, accumulate};
pub use compare::{Comparison, Difference, StructuralComparator, structurally_equal};
pub use diff::{CategoryDiff, ExportDiff, diff_exports};
pub use first_exported::{InferenceStats, infer_first_exported};
pub use ingest::{IngestReport, run_ingest};
