//! Portable inventory archives
//!
//! An archive is a ZIP file with one JSON entry (`inventory.json`) holding
//! `{"items": [...], "categories": [...], "locations": [...]}` plus the
//! item images under `images/<item uuid>_<original file name>`.
//!
//! Row ids are local to one database and never relied upon across
//! archives: items travel by uuid, categories and locations by name. The id
//! fields are still written so that minimal readers can use them.

pub mod export;
pub mod import;

use std::fs::File;
use std::path::Path;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;
use crate::error::{InventoryError, Result};
use crate::utils::image_file_name;
use crate::{ARCHIVE_DATA_ENTRY, ARCHIVE_IMAGES_PREFIX};

/// Exported item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub parent_category_id: i64,
    #[serde(default)]
    pub child_category_id: i64,
    #[serde(default)]
    pub location_id: i64,
    #[serde(default)]
    pub valid_time: i64,
    #[serde(default)]
    pub count: i64,
    /// Source-side image paths joined with `,`
    #[serde(default)]
    pub image_paths: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

/// Exported category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    #[serde(default)]
    pub parent_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

impl CategoryRecord {
    /// True for records describing a top-level category
    pub fn is_top_level(&self) -> bool {
        self.parent_id == crate::UNSET_ID && self.parent_name.is_none()
    }
}

/// Exported location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(default)]
    pub remark: String,
}

/// Top-level JSON document of an archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveDocument {
    pub items: Vec<ItemRecord>,
    pub categories: Vec<CategoryRecord>,
    pub locations: Vec<LocationRecord>,
}

/// Export settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Also export items that are in the recycle bin (exported as active)
    pub include_deleted: bool,
}

/// What an export wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub items: usize,
    pub categories: usize,
    pub locations: usize,
    /// Image entries written
    pub images: usize,
    /// Referenced images that were absent on disk or whose entry name was already taken
    pub missing_images: usize,
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted_categories: usize,
    pub inserted_locations: usize,
    pub inserted_items: usize,
    /// Records already present (dedup hit)
    pub skipped: usize,
    /// Records that could not be decoded or inserted
    pub failed: usize,
    /// Images copied into the inventory's image folder
    pub copied_images: usize,
    /// Image paths dropped because the image was absent or could not be copied
    pub dropped_images: usize,
    /// Human-readable summary
    pub message: String,
}

impl ImportReport {
    /// Total rows created
    pub fn inserted_count(&self) -> usize {
        self.inserted_categories + self.inserted_locations + self.inserted_items
    }

    pub(crate) fn finish(&mut self) {
        self.message = if self.inserted_count() == 0 && self.failed == 0 {
            format!("Nothing to import: {} records already present", self.skipped)
        } else {
            format!(
                "Imported {} categories, {} locations, {} items ({} skipped, {} failed)",
                self.inserted_categories, self.inserted_locations, self.inserted_items, self.skipped, self.failed
            )
        };
    }
}

/// Archive entry name of an item image
pub fn image_entry_name(uuid: &str, file_name: &str) -> String {
    format!("{}{}", ARCHIVE_IMAGES_PREFIX, image_file_name(uuid, file_name))
}

/// Check that a file is a readable archive with a data entry
pub fn verify_archive(archive_path: &Path) -> Result<bool> {
    let file = File::open(archive_path)
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to open archive: {}", e)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to read archive: {}", e)))?;

    match archive.by_name(ARCHIVE_DATA_ENTRY) {
        Ok(file) => Ok(file.size() > 0),
        Err(_) => Ok(false),
    }
}
