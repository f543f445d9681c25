//! Utility functions and helpers.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Format used for capture stamps embedded in snapshot file names.
pub const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

static STAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8}T\d{6})Z").expect("static regex"));

/// Convert epoch seconds (possibly fractional) into a UTC timestamp.
pub fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

/// Convert a UTC timestamp into fractional epoch seconds.
pub fn utc_to_epoch(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

/// Render a capture stamp for use in a file name.
pub fn format_stamp(dt: DateTime<Utc>) -> String {
    dt.format(STAMP_FORMAT).to_string()
}

/// Extract the capture stamp from a snapshot file name.
pub fn parse_stamp(name: &str) -> Option<DateTime<Utc>> {
    let caps = STAMP_RE.captures(name)?;
    let raw = caps.get(1)?.as_str();
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}
