//! Data models for inventory database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::UNSET_ID;

/// Physical inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Surrogate row id, local to this database
    pub id: i64,
    /// Stable identifier shared across restores and archives
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Top-level category id (0 = unset)
    pub parent_category_id: i64,
    /// Child category id (0 = unset)
    pub child_category_id: i64,
    /// Location id (0 = unset)
    pub location_id: i64,
    /// Expiry as epoch milliseconds (0 = no expiry)
    pub valid_time: i64,
    /// Quantity on hand, never negative
    pub count: i64,
    /// Local image file paths, in display order
    pub image_paths: Vec<String>,
    /// Free-form note
    pub remark: String,
    /// Creation timestamp
    pub create_time: DateTime<Utc>,
    /// Last modification timestamp
    pub update_time: DateTime<Utc>,
    /// Soft delete flag
    pub deleted: bool,
}

impl Item {
    /// Check whether the item has an expiry that lies before `now_millis`
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.valid_time != 0 && self.valid_time < now_millis
    }
}

/// Input for creating or updating an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub parent_category_id: i64,
    pub child_category_id: i64,
    pub location_id: i64,
    pub valid_time: i64,
    pub count: i64,
    pub image_paths: Vec<String>,
    pub remark: String,
}

impl NewItem {
    /// Item with only a name; every reference unset
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Item category
///
/// Two levels only: top-level categories have `parent_id == 0`, child
/// categories point at a top-level one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Category {
    /// Check if this is a top-level category
    pub fn is_top_level(&self) -> bool {
        self.parent_id == UNSET_ID
    }
}

/// Storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub remark: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Recycle bin entry for a soft-deleted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecycleRecord {
    pub id: i64,
    /// Row id of the deleted item (local to this database)
    pub item_id: i64,
    /// Durable reference to the deleted item
    pub item_uuid: String,
    /// Item name at deletion time, for display without a join
    pub item_name: String,
    pub delete_time: DateTime<Utc>,
    pub delete_reason: Option<String>,
}

/// Lifecycle state of an item as seen through the recycle bin
#[derive(Debug, Clone, PartialEq)]
pub enum ItemState {
    /// Live item
    Active,
    /// Soft-deleted item with its recycle record
    Deleted(RecycleRecord),
    /// Flagged as deleted but without a recycle record
    Orphaned,
}
