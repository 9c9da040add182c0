//! ID generation utilities

use uuid::Uuid;

/// Generate a new item UUID (hyphenated, lowercase)
pub fn generate_item_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Check whether a string is usable as an item UUID
///
/// Archives produced elsewhere may carry non-RFC identifiers, so only
/// emptiness and separator characters are rejected.
pub fn is_valid_item_uuid(uuid: &str) -> bool {
    !uuid.trim().is_empty()
        && !uuid.contains(crate::IMAGE_PATH_SEPARATOR)
        && !uuid.contains('/')
        && !uuid.contains('\\')
}
