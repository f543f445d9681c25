//! Identity-level diff between two exports.
//!
//! Summarizes which records appeared or disappeared per category. Field-level
//! changes are the business of the structural comparator; this is what gets
//! logged when a new export is ingested.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::models::Category;

/// Added and removed identities for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDiff {
    pub category: String,
    /// In current but not in previous, in current order
    pub added: Vec<String>,
    /// In previous but not in current, in previous order
    pub removed: Vec<String>,
}

impl CategoryDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Diff across every list category of two exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportDiff {
    pub categories: Vec<CategoryDiff>,
}

impl ExportDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        self.categories.iter().any(CategoryDiff::has_changes)
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.added.len() + c.removed.len())
            .sum()
    }

    /// Log a one-line summary for each changed category.
    pub fn log_summary(&self) {
        for diff in self.categories.iter().filter(|d| d.has_changes()) {
            log::info!(
                "Diff {}: {} added, {} removed",
                diff.category,
                diff.added.len(),
                diff.removed.len()
            );
        }
    }
}

/// Calculate the diff between the previous and current export documents.
pub fn diff_exports(previous: &Value, current: &Value) -> ExportDiff {
    let mut keys: Vec<&str> = Vec::new();
    for doc in [current, previous] {
        if let Some(obj) = doc.as_object() {
            for (key, value) in obj {
                if value.is_array() && !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
    }

    let categories = keys
        .into_iter()
        .map(|key| {
            let field = Category::identity_field_for(key);
            let prev_ids = identities(previous.get(key), field);
            let curr_ids = identities(current.get(key), field);

            let prev_set: HashSet<&str> = prev_ids.iter().map(String::as_str).collect();
            let curr_set: HashSet<&str> = curr_ids.iter().map(String::as_str).collect();

            CategoryDiff {
                category: key.to_string(),
                added: curr_ids
                    .iter()
                    .filter(|id| !prev_set.contains(id.as_str()))
                    .cloned()
                    .collect(),
                removed: prev_ids
                    .iter()
                    .filter(|id| !curr_set.contains(id.as_str()))
                    .cloned()
                    .collect(),
            }
        })
        .collect();

    ExportDiff { categories }
}

fn identities(items: Option<&Value>, field: &str) -> Vec<String> {
    items
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get(field))
        .filter(|id| !id.is_null())
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}
