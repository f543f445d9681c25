// src/pipeline/first_exported.rs

//! Inferring when each record first showed up in an export.
//!
//! The API never says when an item was saved, upvoted or received, so every
//! fresh export is compared with the previous one:
//!
//! - records missing from the previous export are stamped with `now`;
//! - records already carrying a stamp keep it unchanged;
//! - records present before the stamp existed stay unstamped, since there is
//!   nothing to derive a value from.
//!
//! Only the immediately previous export is consulted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{Category, FIRST_EXPORTED_KEY, RawRecord};
use crate::utils::utc_to_epoch;

/// Counters describing one inference pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceStats {
    /// Records seen for the first time and stamped with the capture time
    pub stamped: usize,
    /// Records whose previous stamp was carried forward
    pub carried: usize,
    /// Records seen before but never stamped
    pub unknown: usize,
}

/// Return a copy of `current` with `first_exported_utc` filled in.
///
/// Without a previous export there is nothing to compare against and the
/// document is returned as is.
pub fn infer_first_exported(
    current: &Value,
    previous: Option<&Value>,
    now: DateTime<Utc>,
) -> (Value, InferenceStats) {
    let mut stats = InferenceStats::default();
    let (Some(previous), Value::Object(fields)) = (previous, current) else {
        return (current.clone(), stats);
    };

    let now = Value::from(utc_to_epoch(now));
    let annotated = fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Array(items) => {
                    let field = Category::identity_field_for(key);
                    let index = index_previous(previous.get(key), field);
                    Value::Array(
                        items
                            .iter()
                            .map(|item| annotate(item, field, &index, &now, &mut stats))
                            .collect(),
                    )
                }
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect::<Map<_, _>>();

    (Value::Object(annotated), stats)
}

fn index_previous<'p>(previous: Option<&'p Value>, field: &str) -> HashMap<String, &'p RawRecord> {
    previous
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|record| Some((identity(record, field)?, record)))
        .collect()
}

fn annotate(
    item: &Value,
    field: &str,
    index: &HashMap<String, &RawRecord>,
    now: &Value,
    stats: &mut InferenceStats,
) -> Value {
    let Value::Object(record) = item else {
        return item.clone();
    };
    let Some(id) = identity(record, field) else {
        return item.clone();
    };

    let stamp = match index.get(&id) {
        None => {
            stats.stamped += 1;
            Some(now.clone())
        }
        Some(prev) => match prev.get(FIRST_EXPORTED_KEY).filter(|v| !v.is_null()) {
            Some(first) => {
                stats.carried += 1;
                Some(first.clone())
            }
            None => {
                stats.unknown += 1;
                None
            }
        },
    };

    let mut record = record.clone();
    if let Some(stamp) = stamp {
        record.insert(FIRST_EXPORTED_KEY.to_string(), stamp);
    }
    Value::Object(record)
}

/// Identity used for matching; records with a null or absent identity are
/// never matched or stamped.
fn identity(record: &RawRecord, field: &str) -> Option<String> {
    record
        .get(field)
        .filter(|v| !v.is_null())
        .map(Value::to_string)
}
