//! Common utility functions

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;
use crate::IMAGE_PATH_SEPARATOR;

/// Date format for database storage
pub const DB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert DateTime to database string format
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DB_DATE_FORMAT).to_string()
}

/// Parse database datetime string
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DB_DATE_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Get current UTC datetime
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Get current timestamp formatted for database
pub fn now_timestamp() -> String {
    format_datetime(&Utc::now())
}

/// Split a stored/exported image path string into individual paths
///
/// Blank tokens are dropped, surrounding whitespace is trimmed.
pub fn split_image_paths(joined: &str) -> Vec<String> {
    joined
        .split(IMAGE_PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join image paths into the single-string storage/export form
pub fn join_image_paths(paths: &[String]) -> String {
    let mut out = String::new();
    for path in paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push(IMAGE_PATH_SEPARATOR);
        }
        out.push_str(path);
    }
    out
}

/// Final component of a path string, if any
pub fn file_name_of(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Name under which an item's image is stored (archive and private folder)
pub fn image_file_name(uuid: &str, original_name: &str) -> String {
    format!("{}_{}", uuid, original_name)
}
