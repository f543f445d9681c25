// src/pipeline/ingest.rs

//! Persisting a freshly fetched export.
//!
//! The new export is annotated against the latest stored snapshot and then
//! compared with it. When nothing but volatile counters changed, the export is
//! discarded instead of written.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{
    ExportDiff, InferenceStats, StructuralComparator, diff_exports, infer_first_exported,
};
use crate::storage::{SnapshotStorage, WriteOutcome};

/// What happened to an ingested export.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub outcome: WriteOutcome,
    pub inference: InferenceStats,
    /// Identity diff against the previous snapshot, if there was one
    pub diff: Option<ExportDiff>,
}

/// Annotate `export`, then write it unless it is redundant.
///
/// `force` writes even when the export equals the latest snapshot.
pub async fn run_ingest(
    config: &Config,
    storage: &dyn SnapshotStorage,
    export: &Value,
    now: DateTime<Utc>,
    force: bool,
) -> Result<IngestReport> {
    let previous = storage.latest().await?;
    let (annotated, inference) =
        infer_first_exported(export, previous.as_ref().map(|p| p.document()), now);

    log::info!(
        "First-export stamps: {} new, {} carried, {} unknown",
        inference.stamped,
        inference.carried,
        inference.unknown
    );

    let Some(previous) = previous else {
        log::info!("No previous snapshot, writing first export");
        let name = storage.write(&annotated, now).await?;
        return Ok(IngestReport {
            outcome: WriteOutcome::Written { name },
            inference,
            diff: None,
        });
    };

    let diff = diff_exports(previous.document(), &annotated);
    diff.log_summary();

    let comparator = StructuralComparator::from_config(&config.compare);
    if !force && comparator.structurally_equal("", previous.document(), &annotated)? {
        log::info!(
            "Export is identical to {} apart from volatile fields, skipping",
            previous.name()
        );
        return Ok(IngestReport {
            outcome: WriteOutcome::Skipped {
                redundant_with: previous.name().to_string(),
            },
            inference,
            diff: Some(diff),
        });
    }

    let name = storage.write(&annotated, now).await?;
    Ok(IngestReport {
        outcome: WriteOutcome::Written { name },
        inference,
        diff: Some(diff),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FIRST_EXPORTED_KEY;
    use crate::storage::LocalStorage;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn export(score: i64, ids: &[&str]) -> Value {
        let saved: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "title": id, "score": score}))
            .collect();
        json!({"profile": {"name": "me"}, "saved": saved})
    }

    #[tokio::test]
    async fn test_first_export_is_written() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let config = Config::default();

        let report = run_ingest(&config, &storage, &export(1, &["a"]), at(1), false)
            .await
            .unwrap();
        assert!(matches!(report.outcome, WriteOutcome::Written { .. }));
        assert!(report.diff.is_none());

        // Nothing to compare against on the first run, so nothing is stamped.
        let stored = storage.latest().await.unwrap().unwrap();
        assert!(stored.document()["saved"][0].get(FIRST_EXPORTED_KEY).is_none());
    }

    #[tokio::test]
    async fn test_redundant_export_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let config = Config::default();

        run_ingest(&config, &storage, &export(1, &["a"]), at(1), false)
            .await
            .unwrap();
        let report = run_ingest(&config, &storage, &export(99, &["a"]), at(2), false)
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            WriteOutcome::Skipped {
                redundant_with: "reddit-20240501T120000Z.json".into()
            }
        );
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_force_writes_redundant_export() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let config = Config::default();

        run_ingest(&config, &storage, &export(1, &["a"]), at(1), false)
            .await
            .unwrap();
        let report = run_ingest(&config, &storage, &export(1, &["a"]), at(2), true)
            .await
            .unwrap();
        assert!(matches!(report.outcome, WriteOutcome::Written { .. }));
        assert_eq!(storage.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stamps_carry_through_storage() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let config = Config::default();

        run_ingest(&config, &storage, &export(1, &["a"]), at(1), false)
            .await
            .unwrap();
        let second = run_ingest(&config, &storage, &export(1, &["b", "a"]), at(2), false)
            .await
            .unwrap();
        assert_eq!(second.inference.stamped, 1);
        assert_eq!(second.inference.unknown, 1);

        let third = run_ingest(&config, &storage, &export(1, &["c", "b", "a"]), at(3), false)
            .await
            .unwrap();
        assert_eq!(third.inference.carried, 1);
        assert_eq!(third.inference.stamped, 1);

        let latest = storage.latest().await.unwrap().unwrap();
        let saved = latest.document()["saved"].as_array().unwrap();
        let b_stamp = saved[1][FIRST_EXPORTED_KEY].as_f64().unwrap();
        assert_eq!(b_stamp, at(2).timestamp() as f64);
        assert!(saved[2].get(FIRST_EXPORTED_KEY).is_none());
    }
}
