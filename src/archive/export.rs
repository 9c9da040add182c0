//! Archive creation

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use rusqlite::Connection;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;
use log::{debug, error, info, warn};
use crate::error::{InventoryError, Result};
use crate::database::{Category, Item, Location, queries};
use crate::utils::{file_name_of, join_image_paths};
use crate::ARCHIVE_DATA_ENTRY;
use super::{ArchiveDocument, CategoryRecord, ExportOptions, ExportSummary, ItemRecord, LocationRecord, image_entry_name};

/// Write the whole inventory to a ZIP archive
///
/// An existing file at `destination` is removed first, and the partially
/// written file is removed again if anything fails, so a file left at
/// `destination` is always a complete archive.
pub fn write_archive(conn: &Connection, destination: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    if destination.exists() {
        fs::remove_file(destination)
            .map_err(|e| InventoryError::ArchiveError(format!("Failed to remove old archive: {}", e)))?;
    }
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match write_archive_file(conn, destination, options) {
        Ok(summary) => {
            info!(
                "event=export module=archive status=ok items={} categories={} locations={} images={} missing_images={}",
                summary.items, summary.categories, summary.locations, summary.images, summary.missing_images
            );
            Ok(summary)
        }
        Err(err) => {
            let _ = fs::remove_file(destination);
            error!("event=export module=archive status=error error={}", err);
            Err(err)
        }
    }
}

/// Build the JSON document for the given rows
pub fn build_document(items: &[Item], categories: &[Category], locations: &[Location]) -> ArchiveDocument {
    let categories_by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    let locations_by_id: HashMap<i64, &Location> = locations.iter().map(|l| (l.id, l)).collect();
    let category_name = |id: i64| categories_by_id.get(&id).map(|c| c.name.clone());

    ArchiveDocument {
        items: items
            .iter()
            .map(|item| ItemRecord {
                uuid: item.uuid.clone(),
                name: item.name.clone(),
                parent_category_id: item.parent_category_id,
                child_category_id: item.child_category_id,
                location_id: item.location_id,
                valid_time: item.valid_time,
                count: item.count,
                image_paths: join_image_paths(&item.image_paths),
                remark: item.remark.clone(),
                parent_category_name: category_name(item.parent_category_id),
                child_category_name: category_name(item.child_category_id),
                location_name: locations_by_id.get(&item.location_id).map(|l| l.name.clone()),
            })
            .collect(),
        categories: categories
            .iter()
            .map(|category| CategoryRecord {
                parent_id: category.parent_id,
                name: category.name.clone(),
                parent_name: if category.is_top_level() { None } else { category_name(category.parent_id) },
            })
            .collect(),
        locations: locations
            .iter()
            .map(|location| LocationRecord {
                name: location.name.clone(),
                remark: location.remark.clone(),
            })
            .collect(),
    }
}

fn write_archive_file(conn: &Connection, destination: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    let items = if options.include_deleted {
        queries::get_all_items(conn)?
    } else {
        queries::get_items(conn, false)?
    };
    let categories = queries::get_categories(conn)?;
    let locations = queries::get_locations(conn)?;
    let document = build_document(&items, &categories, &locations);

    let zip_file = File::create(destination)
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to create archive file: {}", e)))?;
    let mut zip = ZipWriter::new(zip_file);

    let file_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    zip.start_file(ARCHIVE_DATA_ENTRY, file_options)
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to add data entry: {}", e)))?;
    serde_json::to_writer_pretty(&mut zip, &document)?;

    let mut summary = ExportSummary {
        items: document.items.len(),
        categories: document.categories.len(),
        locations: document.locations.len(),
        ..Default::default()
    };

    let mut written: HashMap<String, &str> = HashMap::new();
    for item in &items {
        for path in &item.image_paths {
            let source = Path::new(path);
            let Some(file_name) = file_name_of(path).filter(|_| source.is_file()) else {
                debug!("event=export_image module=archive status=skip uuid={} path={}", item.uuid, path);
                summary.missing_images += 1;
                continue;
            };

            let entry = image_entry_name(&item.uuid, &file_name);
            if let Some(&first) = written.get(&entry) {
                if first != path.as_str() {
                    // two source files share one entry name; only the first travels
                    warn!(
                        "event=export_image module=archive status=collision uuid={} path={} kept={}",
                        item.uuid, path, first
                    );
                    summary.missing_images += 1;
                }
                continue;
            }
            written.insert(entry.clone(), path.as_str());

            let mut image = File::open(source)
                .map_err(|e| InventoryError::ArchiveError(format!("Failed to open image {}: {}", path, e)))?;
            zip.start_file(entry, file_options)
                .map_err(|e| InventoryError::ArchiveError(format!("Failed to add image to zip: {}", e)))?;
            io::copy(&mut image, &mut zip)
                .map_err(|e| InventoryError::ArchiveError(format!("Failed to write image {}: {}", path, e)))?;
            summary.images += 1;
        }
    }

    zip.finish()
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to finalize zip: {}", e)))?;

    Ok(summary)
}
