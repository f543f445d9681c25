//! Merging one category across a sequence of snapshots.
//!
//! Snapshots are walked in the order given (oldest first) and records within
//! each snapshot in oldest-action-first order. The first copy of every identity
//! wins; later copies are dropped even when their other fields differ.

use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::{Category, RawRecord, Snapshot};

/// Incremental deduplicating merge for a single category.
#[derive(Debug)]
pub struct Accumulator<'a> {
    category: Category,
    seen: HashSet<String>,
    records: Vec<&'a RawRecord>,
}

impl<'a> Accumulator<'a> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Feed one snapshot's records, already in oldest-action-first order.
    ///
    /// Returns the number of records that were new. Fails without emitting
    /// anything from this batch if a record lacks its identity field.
    pub fn feed<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let field = self.category.identity_field();
        let batch = records
            .into_iter()
            .map(|record| identity_key(record, field).map(|key| (key, record)))
            .collect::<Result<Vec<_>>>()?;

        let mut fresh = 0;
        for (key, record) in batch {
            if self.seen.insert(key) {
                self.records.push(record);
                fresh += 1;
            }
        }
        Ok(fresh)
    }

    /// Feed a whole snapshot, applying its reversal rule for this category.
    pub fn feed_snapshot(&mut self, snapshot: &'a Snapshot) -> Result<usize> {
        let records = snapshot.records(self.category)?;
        let chunk = records.len();
        let fresh = self.feed(records)?;
        log::debug!(
            "{:>12}: finished processing {}: {:4}/{:4} new; total: {}",
            self.category,
            snapshot.name(),
            fresh,
            chunk,
            self.seen.len()
        );
        Ok(fresh)
    }

    /// Number of unique identities seen so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finish the merge, yielding records in first-seen order.
    pub fn finish(self) -> Vec<&'a RawRecord> {
        self.records
    }
}

/// Merge `category` across snapshots supplied oldest first.
pub fn accumulate<'a, I>(category: Category, snapshots: I) -> Result<Vec<&'a RawRecord>>
where
    I: IntoIterator<Item = &'a Snapshot>,
{
    let mut acc = Accumulator::new(category);
    for snapshot in snapshots {
        acc.feed_snapshot(snapshot)?;
    }
    if acc.is_empty() {
        log::debug!("No {category} records in any snapshot");
    }
    Ok(acc.finish())
}

/// Hashable identity of a record.
///
/// The JSON rendering keeps `"1"` and `1` apart and gives `null` or `""` a
/// stable key of their own.
fn identity_key(record: &RawRecord, field: &str) -> Result<String> {
    record
        .get(field)
        .map(|value| value.to_string())
        .ok_or_else(|| AppError::missing(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn ids(records: &[&RawRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| match &r["id"] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    fn snapshot_a() -> Snapshot {
        Snapshot::new(
            "reddit-20240101T000000Z.json",
            json!({"saved": [
                {"id": "1", "created_utc": 100, "title": "x"},
                {"id": "2", "created_utc": 90, "title": "y"},
            ]}),
        )
    }

    fn snapshot_b() -> Snapshot {
        Snapshot::new(
            "reddit-20240201T000000Z.json",
            json!({"saved": [
                {"id": "3", "created_utc": 110, "title": "z"},
                {"id": "1", "created_utc": 100, "title": "x (edited)"},
            ]}),
        )
    }

    #[test]
    fn test_reversal_before_accumulation() {
        let (a, b) = (snapshot_a(), snapshot_b());
        let merged = accumulate(Category::Saved, [&a, &b]).unwrap();
        assert_eq!(ids(&merged), ["2", "1", "3"]);
    }

    #[test]
    fn test_first_seen_wins() {
        let (a, b) = (snapshot_a(), snapshot_b());
        let merged = accumulate(Category::Saved, [&a, &b]).unwrap();
        let one = merged.iter().find(|r| r["id"] == "1").unwrap();
        assert_eq!(one["title"], "x");
        assert_eq!(merged.iter().filter(|r| r["id"] == "1").count(), 1);
    }

    #[test]
    fn test_idempotent() {
        let a = snapshot_a();
        let once = accumulate(Category::Saved, [&a]).unwrap();
        let twice = accumulate(Category::Saved, [&a, &a]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_disjoint_snapshots_keep_boundaries() {
        let s1 = Snapshot::new("s1", json!({"comments": [{"id": "b"}, {"id": "a"}]}));
        let s2 = Snapshot::new("s2", json!({"comments": [{"id": "d"}, {"id": "c"}]}));
        let merged = accumulate(Category::Comments, [&s1, &s2]).unwrap();
        assert_eq!(ids(&merged), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_duplicates_within_snapshot() {
        let s = Snapshot::new(
            "s",
            json!({"upvoted": [{"id": "1", "v": "newer"}, {"id": "2"}, {"id": "1", "v": "older"}]}),
        );
        let merged = accumulate(Category::Upvoted, [&s]).unwrap();
        assert_eq!(ids(&merged), ["1", "2"]);
        assert_eq!(merged[0]["v"], "older");
    }

    #[test]
    fn test_degenerate_identities() {
        let s = Snapshot::new(
            "s",
            json!({"inbox": [{"id": null}, {"id": ""}, {"id": null}, {"id": 1}, {"id": "1"}]}),
        );
        let merged = accumulate(Category::Inbox, [&s]).unwrap();
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_multireddits_use_path() {
        let s1 = Snapshot::new("s1", json!({"multireddits": [{"path": "/m/a"}]}));
        let s2 = Snapshot::new(
            "s2",
            json!({"multireddits": [{"path": "/m/b"}, {"path": "/m/a"}]}),
        );
        let merged = accumulate(Category::Multireddits, [&s1, &s2]).unwrap();
        let paths: Vec<_> = merged.iter().map(|r| r["path"].as_str().unwrap()).collect();
        assert_eq!(paths, ["/m/a", "/m/b"]);
    }

    #[test]
    fn test_missing_category_in_old_snapshot() {
        let old = Snapshot::new("old", json!({"saved": []}));
        let new = Snapshot::new("new", json!({"inbox": [{"id": "m1"}]}));
        let merged = accumulate(Category::Inbox, [&old, &new]).unwrap();
        assert_eq!(ids(&merged), ["m1"]);
    }

    #[test]
    fn test_missing_identity_fails() {
        let s = Snapshot::new("s", json!({"saved": [{"title": "no id"}]}));
        assert!(matches!(
            accumulate(Category::Saved, [&s]),
            Err(AppError::MissingField { field }) if field == "id"
        ));
    }

    #[test]
    fn test_feed_counts_new_records() {
        let (a, b) = (snapshot_a(), snapshot_b());
        let mut acc = Accumulator::new(Category::Saved);
        assert_eq!(acc.feed_snapshot(&a).unwrap(), 2);
        assert_eq!(acc.feed_snapshot(&b).unwrap(), 1);
        assert_eq!(acc.len(), 3);
    }
}
