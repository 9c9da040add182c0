//! Archive import
//!
//! Merges an archive into an existing inventory. The archive is unpacked
//! into a scratch folder that is removed on every exit path. Structural
//! problems (missing file, unreadable ZIP, missing JSON document or one of
//! its arrays) abort before anything is written; problems with a single
//! record only count that record as failed.
//!
//! Categories are imported first (top-level before children), then
//! locations, then items, so items can be linked to rows created by the
//! same import. Links are resolved by name; the raw ids of an archive are
//! only trusted when no names were exported and the id refers to a row of
//! the right kind in this database.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use zip::ZipArchive;
use log::{debug, error, info, warn};
use crate::error::{InventoryError, Result};
use crate::database::{NewItem, queries};
use crate::utils::{file_name_of, image_file_name, is_valid_item_uuid, split_image_paths};
use crate::{ARCHIVE_DATA_ENTRY, ARCHIVE_IMAGES_PREFIX, IMPORT_SCRATCH_PREFIX, UNSET_ID};
use super::{CategoryRecord, ImportReport, ItemRecord, LocationRecord};

/// Per-record result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Inserted,
    Skipped,
}

/// The three record arrays of an archive, still undecoded
struct DocumentArrays {
    items: Vec<Value>,
    categories: Vec<Value>,
    locations: Vec<Value>,
}

/// Import an archive into the database behind `conn`
///
/// The archive is unpacked into a scratch folder created under
/// `scratch_root`. Images of new items are copied into `images_folder`.
pub fn read_archive(
    conn: &mut Connection,
    archive_path: &Path,
    scratch_root: &Path,
    images_folder: &Path,
) -> Result<ImportReport> {
    fs::create_dir_all(scratch_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(IMPORT_SCRATCH_PREFIX)
        .tempdir_in(scratch_root)
        .map_err(|e| InventoryError::ArchiveError(format!("Failed to create scratch folder: {}", e)))?;

    let result = import_from_scratch(conn, archive_path, scratch.path(), images_folder);

    if let Err(err) = scratch.close() {
        warn!("event=import_cleanup module=archive status=error error={}", err);
    }

    match &result {
        Ok(report) => info!(
            "event=import module=archive status=ok inserted={} skipped={} failed={} images={}",
            report.inserted_count(), report.skipped, report.failed, report.copied_images
        ),
        Err(err) => error!("event=import module=archive status=error error={}", err),
    }
    result
}

fn import_from_scratch(
    conn: &mut Connection,
    archive_path: &Path,
    scratch: &Path,
    images_folder: &Path,
) -> Result<ImportReport> {
    let arrays = extract_document(archive_path, scratch)?;
    fs::create_dir_all(images_folder)?;

    let tx = conn.transaction()?;
    let mut report = ImportReport::default();
    let mut copied = Vec::new();

    import_categories(&tx, &arrays.categories, &mut report);

    for value in &arrays.locations {
        let outcome = decode::<LocationRecord>(value).and_then(|record| import_location(&tx, &record));
        tally(&mut report, outcome, "location", |r| r.inserted_locations += 1);
    }

    let image_source = scratch.join(ARCHIVE_IMAGES_PREFIX.trim_end_matches('/'));
    for value in &arrays.items {
        let outcome = decode::<ItemRecord>(value)
            .and_then(|record| import_item(&tx, &record, &image_source, images_folder, &mut report, &mut copied));
        tally(&mut report, outcome, "item", |r| r.inserted_items += 1);
    }

    if let Err(err) = tx.commit() {
        remove_files(&copied);
        return Err(err.into());
    }

    report.finish();
    Ok(report)
}

/// Unpack the archive and pull out the three record arrays
fn extract_document(archive_path: &Path, scratch: &Path) -> Result<DocumentArrays> {
    if !archive_path.is_file() {
        return Err(InventoryError::InvalidArchive(format!(
            "Archive not found: {}",
            archive_path.display()
        )));
    }

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| InventoryError::InvalidArchive(format!("Failed to read archive: {}", e)))?;
    match archive.extract(scratch) {
        Ok(()) => {}
        Err(zip::result::ZipError::Io(e)) => return Err(e.into()),
        Err(e) => return Err(InventoryError::InvalidArchive(format!("Failed to extract archive: {}", e))),
    }

    let data_path = scratch.join(ARCHIVE_DATA_ENTRY);
    if !data_path.is_file() {
        return Err(InventoryError::InvalidArchive(format!("{} not found in archive", ARCHIVE_DATA_ENTRY)));
    }
    let data = fs::read(&data_path)?;
    let document: Value = serde_json::from_slice(&data)
        .map_err(|e| InventoryError::InvalidArchive(format!("Malformed {}: {}", ARCHIVE_DATA_ENTRY, e)))?;
    let Value::Object(mut document) = document else {
        return Err(InventoryError::InvalidArchive(format!("{} is not a JSON object", ARCHIVE_DATA_ENTRY)));
    };

    Ok(DocumentArrays {
        items: take_array(&mut document, "items")?,
        categories: take_array(&mut document, "categories")?,
        locations: take_array(&mut document, "locations")?,
    })
}

fn take_array(document: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match document.remove(key) {
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(InventoryError::InvalidArchive(format!("\"{}\" is not an array", key))),
        None => Err(InventoryError::InvalidArchive(format!("missing \"{}\" array", key))),
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| InventoryError::InvalidArchive(format!("Malformed record: {}", e)))
}

fn tally(
    report: &mut ImportReport,
    outcome: Result<RecordOutcome>,
    what: &str,
    on_insert: impl FnOnce(&mut ImportReport),
) {
    match outcome {
        Ok(RecordOutcome::Inserted) => on_insert(report),
        Ok(RecordOutcome::Skipped) => report.skipped += 1,
        Err(err) => {
            warn!("event=import_record module=archive status=error kind={} error={}", what, err);
            report.failed += 1;
        }
    }
}

fn import_categories(conn: &Connection, values: &[Value], report: &mut ImportReport) {
    let mut top_level = Vec::new();
    let mut children = Vec::new();
    for value in values {
        match decode::<CategoryRecord>(value) {
            Ok(record) if record.is_top_level() => top_level.push(record),
            Ok(record) => children.push(record),
            Err(err) => tally(report, Err(err), "category", |_| {}),
        }
    }

    for record in top_level.iter().chain(children.iter()) {
        let outcome = import_category(conn, record);
        tally(report, outcome, "category", |r| r.inserted_categories += 1);
    }
}

fn import_category(conn: &Connection, record: &CategoryRecord) -> Result<RecordOutcome> {
    let name = required_name(&record.name, "category")?;
    let parent_id = resolve_category_parent(conn, record)?;

    if queries::find_category(conn, name, parent_id)?.is_some() {
        return Ok(RecordOutcome::Skipped);
    }
    queries::insert_category(conn, name, parent_id)?;
    Ok(RecordOutcome::Inserted)
}

/// Local id of the parent of a category record (0 for top-level)
fn resolve_category_parent(conn: &Connection, record: &CategoryRecord) -> Result<i64> {
    if record.is_top_level() {
        return Ok(UNSET_ID);
    }
    let parent = match &record.parent_name {
        Some(parent_name) => queries::find_category(conn, parent_name, UNSET_ID)?,
        None => queries::get_category(conn, record.parent_id)?.filter(|c| c.is_top_level()),
    };
    parent.map(|c| c.id).ok_or_else(|| {
        InventoryError::InvalidArchive(format!("parent of category \"{}\" cannot be resolved", record.name))
    })
}

fn import_location(conn: &Connection, record: &LocationRecord) -> Result<RecordOutcome> {
    let name = required_name(&record.name, "location")?;
    if queries::find_location(conn, name)?.is_some() {
        return Ok(RecordOutcome::Skipped);
    }
    queries::insert_location(conn, name, &record.remark)?;
    Ok(RecordOutcome::Inserted)
}

fn import_item(
    conn: &Connection,
    record: &ItemRecord,
    image_source: &Path,
    images_folder: &Path,
    report: &mut ImportReport,
    copied: &mut Vec<PathBuf>,
) -> Result<RecordOutcome> {
    if !is_valid_item_uuid(&record.uuid) {
        return Err(InventoryError::InvalidArchive(format!("invalid item uuid \"{}\"", record.uuid)));
    }
    let name = required_name(&record.name, "item")?;
    if record.count < 0 || record.valid_time < 0 {
        return Err(InventoryError::InvalidArchive(format!("item {} has negative count or valid time", record.uuid)));
    }
    if queries::item_uuid_exists(conn, &record.uuid)? {
        return Ok(RecordOutcome::Skipped);
    }

    let (parent_category_id, child_category_id) = resolve_item_categories(conn, record)?;
    let location_id = resolve_item_location(conn, record)?;

    let mut image_paths = Vec::new();
    let mut item_copies = Vec::new();
    for token in split_image_paths(&record.image_paths) {
        match relocate_image(&record.uuid, &token, image_source, images_folder) {
            Some(local) => {
                image_paths.push(local.to_string_lossy().to_string());
                item_copies.push(local);
            }
            None => report.dropped_images += 1,
        }
    }

    let new_item = NewItem {
        name: name.to_string(),
        parent_category_id,
        child_category_id,
        location_id,
        valid_time: record.valid_time,
        count: record.count,
        image_paths,
        remark: record.remark.clone(),
    };
    if let Err(err) = queries::insert_item(conn, &record.uuid, &new_item) {
        remove_files(&item_copies);
        return Err(err);
    }

    report.copied_images += item_copies.len();
    copied.extend(item_copies);
    Ok(RecordOutcome::Inserted)
}

fn resolve_item_categories(conn: &Connection, record: &ItemRecord) -> Result<(i64, i64)> {
    let parent = match &record.parent_category_name {
        Some(name) => queries::find_category(conn, name, UNSET_ID)?,
        None if record.parent_category_id != UNSET_ID => {
            queries::get_category(conn, record.parent_category_id)?.filter(|c| c.is_top_level())
        }
        None => None,
    };
    let parent_id = parent.map(|c| c.id).unwrap_or(UNSET_ID);
    if parent_id == UNSET_ID {
        return Ok((UNSET_ID, UNSET_ID));
    }

    let child = match &record.child_category_name {
        Some(name) => queries::find_category(conn, name, parent_id)?,
        None if record.child_category_id != UNSET_ID => {
            queries::get_category(conn, record.child_category_id)?.filter(|c| c.parent_id == parent_id)
        }
        None => None,
    };
    Ok((parent_id, child.map(|c| c.id).unwrap_or(UNSET_ID)))
}

fn resolve_item_location(conn: &Connection, record: &ItemRecord) -> Result<i64> {
    let location = match &record.location_name {
        Some(name) => queries::find_location(conn, name)?,
        None if record.location_id != UNSET_ID => queries::get_location(conn, record.location_id)?,
        None => None,
    };
    Ok(location.map(|l| l.id).unwrap_or(UNSET_ID))
}

/// Copy one archived image into the image folder, returning its new path
fn relocate_image(uuid: &str, token: &str, image_source: &Path, images_folder: &Path) -> Option<PathBuf> {
    let file_name = image_file_name(uuid, &file_name_of(token)?);
    let source = image_source.join(&file_name);
    if !source.is_file() {
        debug!("event=import_image module=archive status=skip uuid={} path={}", uuid, token);
        return None;
    }

    let destination = images_folder.join(&file_name);
    match fs::copy(&source, &destination) {
        Ok(_) => Some(destination),
        Err(err) => {
            warn!("event=import_image module=archive status=error uuid={} path={} error={}", uuid, token, err);
            None
        }
    }
}

fn required_name<'a>(name: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::InvalidArchive(format!("{} record without a name", what)));
    }
    Ok(trimmed)
}

fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            warn!("event=import_rollback module=archive status=error path={} error={}", path.display(), err);
        }
    }
}
