//! Snapshot documents and per-category record extraction.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Category, RawRecord};
use crate::utils::parse_stamp;

/// One full export capture, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    name: String,
    captured_at: Option<DateTime<Utc>>,
    document: Value,
}

impl Snapshot {
    /// Create a snapshot, reading the capture time from the stamp in `name`.
    pub fn new(name: impl Into<String>, document: Value) -> Self {
        let name = name.into();
        let captured_at = parse_stamp(&name);
        Self {
            name,
            captured_at,
            document,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// Records of `category` in oldest-action-first order.
    ///
    /// Stored listings are newest first, so categories flagged by
    /// [`Category::is_newest_first`] are reversed here. A category missing from
    /// the document yields no records.
    pub fn records(&self, category: Category) -> Result<Vec<&RawRecord>> {
        let mut records = self.stored_records(category)?;
        if category.is_newest_first() {
            records.reverse();
        }
        Ok(records)
    }

    /// Records of `category` in the order they are stored.
    pub fn stored_records(&self, category: Category) -> Result<Vec<&RawRecord>> {
        let root = self
            .document
            .as_object()
            .ok_or_else(|| AppError::malformed(&self.name, "snapshot is not a JSON object"))?;

        let key = category.as_str();
        match root.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(single)) if !category.is_list() => Ok(vec![single]),
            Some(Value::Array(items)) if category.is_list() => items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    item.as_object().ok_or_else(|| {
                        AppError::malformed(format!("{key}[{idx}]"), "record is not a JSON object")
                    })
                })
                .collect(),
            Some(other) => Err(AppError::malformed(
                key,
                format!("unexpected {} in {}", json_kind(other), self.name),
            )),
        }
    }
}

/// Ordering used for snapshot sequences: capture time, then name.
pub fn chronological(a: &Snapshot, b: &Snapshot) -> Ordering {
    a.captured_at
        .cmp(&b.captured_at)
        .then_with(|| a.name.cmp(&b.name))
}

/// Human-readable name of a JSON value's type.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
