//! Structural comparison of export documents.
//!
//! Used to decide whether a freshly fetched export adds anything over the last
//! stored one. Paths are built as `.key` for object members and `[]` for array
//! elements, so `.saved[].score` names the score of every saved item. Any path
//! ending in one of the configured suffixes is treated as equal.

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CompareConfig, json_kind};

/// One point where two documents disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    /// Two scalars (or a scalar and a container) differ
    Value { path: String },
    /// Arrays of different length
    Length {
        path: String,
        left: usize,
        right: usize,
    },
    /// Objects with different key sets
    Keys {
        path: String,
        only_left: Vec<String>,
        only_right: Vec<String>,
    },
}

/// Outcome of a comparison, with the trail of differences found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    pub differences: Vec<Difference>,
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Deep comparator with a suffix ignore-list.
#[derive(Debug, Clone)]
pub struct StructuralComparator {
    ignore_suffixes: Vec<String>,
}

impl StructuralComparator {
    pub fn new(ignore_suffixes: Vec<String>) -> Self {
        Self { ignore_suffixes }
    }

    pub fn from_config(config: &CompareConfig) -> Self {
        Self::new(config.ignore_suffixes.clone())
    }

    /// Compare two documents and collect every difference.
    ///
    /// Fails with [`AppError::TypeMismatch`] when an array and an object meet
    /// at the same path, which means the export schema itself changed.
    pub fn compare(&self, a: &Value, b: &Value) -> Result<Comparison> {
        let mut trail = Vec::new();
        self.walk("", a, b, &mut Some(&mut trail))?;
        Ok(Comparison { differences: trail })
    }

    /// Whether the documents are equal, stopping at the first difference.
    pub fn structurally_equal(&self, path: &str, a: &Value, b: &Value) -> Result<bool> {
        self.walk(path, a, b, &mut None)
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.ignore_suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }

    /// Returns whether the subtrees are equal. With a trail, keeps walking past
    /// differences to record all of them.
    fn walk(
        &self,
        path: &str,
        a: &Value,
        b: &Value,
        trail: &mut Option<&mut Vec<Difference>>,
    ) -> Result<bool> {
        if self.is_ignored(path) {
            return Ok(true);
        }

        match (a, b) {
            (Value::Array(left), Value::Array(right)) => {
                let child = format!("{path}[]");
                if left.len() != right.len() {
                    if let Some(t) = trail.as_deref_mut() {
                        t.push(Difference::Length {
                            path: path.to_string(),
                            left: left.len(),
                            right: right.len(),
                        });
                    }
                    return Ok(false);
                }
                let mut equal = true;
                for (x, y) in left.iter().zip(right) {
                    if !self.walk(&child, x, y, trail)? {
                        equal = false;
                        if trail.is_none() {
                            break;
                        }
                    }
                }
                Ok(equal)
            }
            (Value::Object(left), Value::Object(right)) => {
                let only_left: Vec<String> = left
                    .keys()
                    .filter(|k| !right.contains_key(*k))
                    .cloned()
                    .collect();
                let only_right: Vec<String> = right
                    .keys()
                    .filter(|k| !left.contains_key(*k))
                    .cloned()
                    .collect();

                let mut equal = only_left.is_empty() && only_right.is_empty();
                if !equal {
                    match trail.as_deref_mut() {
                        Some(t) => t.push(Difference::Keys {
                            path: path.to_string(),
                            only_left,
                            only_right,
                        }),
                        None => return Ok(false),
                    }
                }

                for (key, x) in left {
                    let Some(y) = right.get(key) else { continue };
                    if !self.walk(&format!("{path}.{key}"), x, y, trail)? {
                        equal = false;
                        if trail.is_none() {
                            break;
                        }
                    }
                }
                Ok(equal)
            }
            (Value::Array(_), Value::Object(_)) | (Value::Object(_), Value::Array(_)) => {
                Err(AppError::TypeMismatch {
                    path: path.to_string(),
                    left: json_kind(a),
                    right: json_kind(b),
                })
            }
            _ => {
                let equal = a == b;
                if !equal {
                    if let Some(t) = trail.as_deref_mut() {
                        t.push(Difference::Value {
                            path: path.to_string(),
                        });
                    }
                }
                Ok(equal)
            }
        }
    }
}

impl Default for StructuralComparator {
    fn default() -> Self {
        Self::from_config(&CompareConfig::default())
    }
}

/// Convenience check with the default ignore-list.
pub fn structurally_equal(a: &Value, b: &Value) -> Result<bool> {
    StructuralComparator::default().structurally_equal("", a, b)
}
