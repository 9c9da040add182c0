//! SQL query operations for database access
//!
//! This module provides low-level query functions for database operations.
//! Business rules (validation, recycle bin consistency) live in the
//! Inventory API.

use rusqlite::{Connection, OptionalExtension, Row, params};
use chrono::{DateTime, Utc};
use crate::error::Result;
use crate::utils::{join_image_paths, now_timestamp, parse_datetime, split_image_paths};
use super::models::{Category, Item, Location, NewItem, RecycleRecord};

fn timestamp_or_now(raw: Option<String>) -> DateTime<Utc> {
    raw.as_deref().and_then(parse_datetime).unwrap_or_else(Utc::now)
}

// ============================================================================
// Items queries
// ============================================================================

const ITEM_COLUMNS: &str = "id, uuid, name, parent_category_id, child_category_id, location_id,
    valid_time, count, image_paths, remark, create_time, update_time, is_deleted";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let image_paths: String = row.get(8)?;
    Ok(Item {
        id: row.get(0)?,
        uuid: row.get(1)?,
        name: row.get(2)?,
        parent_category_id: row.get(3)?,
        child_category_id: row.get(4)?,
        location_id: row.get(5)?,
        valid_time: row.get(6)?,
        count: row.get(7)?,
        image_paths: split_image_paths(&image_paths),
        remark: row.get(9)?,
        create_time: timestamp_or_now(row.get(10)?),
        update_time: timestamp_or_now(row.get(11)?),
        deleted: row.get::<_, i32>(12)? != 0,
    })
}

/// Get items filtered by deletion state
pub fn get_items(conn: &Connection, deleted: bool) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_items WHERE is_deleted = ? ORDER BY id",
        ITEM_COLUMNS
    ))?;
    let items = stmt.query_map(params![deleted as i32], item_from_row)?;
    items.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get every item regardless of deletion state
pub fn get_all_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_items ORDER BY id",
        ITEM_COLUMNS
    ))?;
    let items = stmt.query_map([], item_from_row)?;
    items.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get active items stored at a location
pub fn get_items_by_location(conn: &Connection, location_id: i64) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_items WHERE is_deleted = 0 AND location_id = ? ORDER BY id",
        ITEM_COLUMNS
    ))?;
    let items = stmt.query_map(params![location_id], item_from_row)?;
    items.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get active items filed under a category at either level
pub fn get_items_by_category(conn: &Connection, category_id: i64) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_items
         WHERE is_deleted = 0 AND (parent_category_id = ?1 OR child_category_id = ?1)
         ORDER BY id",
        ITEM_COLUMNS
    ))?;
    let items = stmt.query_map(params![category_id], item_from_row)?;
    items.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get an item by row id
pub fn get_item(conn: &Connection, id: i64) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {} FROM inventory_items WHERE id = ?", ITEM_COLUMNS),
            params![id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

/// Get an item by uuid
pub fn get_item_by_uuid(conn: &Connection, uuid: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {} FROM inventory_items WHERE uuid = ?", ITEM_COLUMNS),
            params![uuid],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

/// Check whether an item with the uuid exists
pub fn item_uuid_exists(conn: &Connection, uuid: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM inventory_items WHERE uuid = ?",
        params![uuid],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a new active item, returning its row id
pub fn insert_item(conn: &Connection, uuid: &str, item: &NewItem) -> Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO inventory_items (uuid, name, parent_category_id, child_category_id, location_id,
            valid_time, count, image_paths, remark, create_time, update_time, is_deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        params![
            uuid,
            item.name,
            item.parent_category_id,
            item.child_category_id,
            item.location_id,
            item.valid_time,
            item.count,
            join_image_paths(&item.image_paths),
            item.remark,
            now,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update the editable fields of an item
pub fn update_item(conn: &Connection, id: i64, item: &NewItem) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_items SET name = ?, parent_category_id = ?, child_category_id = ?,
            location_id = ?, valid_time = ?, count = ?, image_paths = ?, remark = ?, update_time = ?
         WHERE id = ?",
        params![
            item.name,
            item.parent_category_id,
            item.child_category_id,
            item.location_id,
            item.valid_time,
            item.count,
            join_image_paths(&item.image_paths),
            item.remark,
            now_timestamp(),
            id
        ],
    )?;
    Ok(rows)
}

/// Update item count
pub fn update_item_count(conn: &Connection, id: i64, count: i64) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_items SET count = ?, update_time = ? WHERE id = ?",
        params![count, now_timestamp(), id],
    )?;
    Ok(rows)
}

/// Flip the soft delete flag
///
/// Only rows currently in the opposite state are touched, so the returned
/// row count tells whether the flip happened.
pub fn set_item_deleted(conn: &Connection, id: i64, deleted: bool) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_items SET is_deleted = ?, update_time = ? WHERE id = ? AND is_deleted = ?",
        params![deleted as i32, now_timestamp(), id, (!deleted) as i32],
    )?;
    Ok(rows)
}

/// Permanently delete an item row
pub fn delete_item(conn: &Connection, id: i64) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_items WHERE id = ?", params![id])?;
    Ok(rows)
}

/// Permanently delete every soft-deleted item
pub fn delete_deleted_items(conn: &Connection) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_items WHERE is_deleted = 1", [])?;
    Ok(rows)
}

/// Soft-deleted items that have no recycle record
pub fn get_deleted_items_without_record(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_items
         WHERE is_deleted = 1
           AND id NOT IN (SELECT item_id FROM inventory_recycle_records)
         ORDER BY id",
        ITEM_COLUMNS
    ))?;
    let items = stmt.query_map([], item_from_row)?;
    items.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Unset a category on every item referencing it (either level)
pub fn clear_category_references(conn: &Connection, category_id: i64) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_items SET
            parent_category_id = CASE WHEN parent_category_id = ?1 THEN 0 ELSE parent_category_id END,
            child_category_id = CASE WHEN child_category_id = ?1 THEN 0 ELSE child_category_id END,
            update_time = ?2
         WHERE parent_category_id = ?1 OR child_category_id = ?1",
        params![category_id, now_timestamp()],
    )?;
    Ok(rows)
}

/// Unset a location on every item referencing it
pub fn clear_location_references(conn: &Connection, location_id: i64) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_items SET location_id = 0, update_time = ? WHERE location_id = ?",
        params![now_timestamp(), location_id],
    )?;
    Ok(rows)
}

// ============================================================================
// Categories queries
// ============================================================================

const CATEGORY_COLUMNS: &str = "id, parent_id, name, create_time, update_time";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        name: row.get(2)?,
        create_time: timestamp_or_now(row.get(3)?),
        update_time: timestamp_or_now(row.get(4)?),
    })
}

/// Get all categories, top-level first
pub fn get_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_categories ORDER BY parent_id, name",
        CATEGORY_COLUMNS
    ))?;
    let categories = stmt.query_map([], category_from_row)?;
    categories.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get categories directly under a parent (0 for top-level)
pub fn get_categories_by_parent(conn: &Connection, parent_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_categories WHERE parent_id = ? ORDER BY name",
        CATEGORY_COLUMNS
    ))?;
    let categories = stmt.query_map(params![parent_id], category_from_row)?;
    categories.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get a category by id
pub fn get_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            &format!("SELECT {} FROM inventory_categories WHERE id = ?", CATEGORY_COLUMNS),
            params![id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

/// Find a category by its dedup key (name within parent)
pub fn find_category(conn: &Connection, name: &str, parent_id: i64) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            &format!(
                "SELECT {} FROM inventory_categories WHERE name = ? AND parent_id = ?",
                CATEGORY_COLUMNS
            ),
            params![name, parent_id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

/// Insert a category, returning its id
pub fn insert_category(conn: &Connection, name: &str, parent_id: i64) -> Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO inventory_categories (parent_id, name, create_time, update_time) VALUES (?, ?, ?, ?)",
        params![parent_id, name, now, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rename a category
pub fn rename_category(conn: &Connection, id: i64, name: &str) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_categories SET name = ?, update_time = ? WHERE id = ?",
        params![name, now_timestamp(), id],
    )?;
    Ok(rows)
}

/// Delete a category row
pub fn delete_category(conn: &Connection, id: i64) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_categories WHERE id = ?", params![id])?;
    Ok(rows)
}

// ============================================================================
// Locations queries
// ============================================================================

const LOCATION_COLUMNS: &str = "id, name, remark, create_time, update_time";

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        remark: row.get(2)?,
        create_time: timestamp_or_now(row.get(3)?),
        update_time: timestamp_or_now(row.get(4)?),
    })
}

/// Get all locations ordered by name
pub fn get_locations(conn: &Connection) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_locations ORDER BY name",
        LOCATION_COLUMNS
    ))?;
    let locations = stmt.query_map([], location_from_row)?;
    locations.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get a location by id
pub fn get_location(conn: &Connection, id: i64) -> Result<Option<Location>> {
    let location = conn
        .query_row(
            &format!("SELECT {} FROM inventory_locations WHERE id = ?", LOCATION_COLUMNS),
            params![id],
            location_from_row,
        )
        .optional()?;
    Ok(location)
}

/// Find a location by name
pub fn find_location(conn: &Connection, name: &str) -> Result<Option<Location>> {
    let location = conn
        .query_row(
            &format!("SELECT {} FROM inventory_locations WHERE name = ?", LOCATION_COLUMNS),
            params![name],
            location_from_row,
        )
        .optional()?;
    Ok(location)
}

/// Insert a location, returning its id
pub fn insert_location(conn: &Connection, name: &str, remark: &str) -> Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO inventory_locations (name, remark, create_time, update_time) VALUES (?, ?, ?, ?)",
        params![name, remark, now, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update location name and remark
pub fn update_location(conn: &Connection, id: i64, name: &str, remark: &str) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE inventory_locations SET name = ?, remark = ?, update_time = ? WHERE id = ?",
        params![name, remark, now_timestamp(), id],
    )?;
    Ok(rows)
}

/// Delete a location row
pub fn delete_location(conn: &Connection, id: i64) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_locations WHERE id = ?", params![id])?;
    Ok(rows)
}

// ============================================================================
// Recycle records queries
// ============================================================================

const RECYCLE_COLUMNS: &str = "id, item_id, item_uuid, item_name, delete_time, delete_reason";

fn recycle_record_from_row(row: &Row<'_>) -> rusqlite::Result<RecycleRecord> {
    Ok(RecycleRecord {
        id: row.get(0)?,
        item_id: row.get(1)?,
        item_uuid: row.get(2)?,
        item_name: row.get(3)?,
        delete_time: timestamp_or_now(row.get(4)?),
        delete_reason: row.get(5)?,
    })
}

/// Insert a recycle record for an item, returning the record id
pub fn insert_recycle_record(conn: &Connection, item: &Item, reason: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO inventory_recycle_records (item_id, item_uuid, item_name, delete_time, delete_reason)
         VALUES (?, ?, ?, ?, ?)",
        params![item.id, item.uuid, item.name, now_timestamp(), reason],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a recycle record by id
pub fn get_recycle_record(conn: &Connection, id: i64) -> Result<Option<RecycleRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {} FROM inventory_recycle_records WHERE id = ?", RECYCLE_COLUMNS),
            params![id],
            recycle_record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Get the recycle record of an item (oldest one if several exist)
pub fn get_recycle_record_for_item(conn: &Connection, item_id: i64) -> Result<Option<RecycleRecord>> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {} FROM inventory_recycle_records WHERE item_id = ? ORDER BY id LIMIT 1",
                RECYCLE_COLUMNS
            ),
            params![item_id],
            recycle_record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Get all recycle records, newest first
pub fn get_recycle_records(conn: &Connection) -> Result<Vec<RecycleRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM inventory_recycle_records ORDER BY delete_time DESC, id DESC",
        RECYCLE_COLUMNS
    ))?;
    let records = stmt.query_map([], recycle_record_from_row)?;
    records.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Delete a recycle record by id
pub fn delete_recycle_record(conn: &Connection, id: i64) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_recycle_records WHERE id = ?", params![id])?;
    Ok(rows)
}

/// Delete every recycle record of an item
pub fn delete_recycle_records_for_item(conn: &Connection, item_id: i64) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM inventory_recycle_records WHERE item_id = ?",
        params![item_id],
    )?;
    Ok(rows)
}

/// Delete all recycle records
pub fn delete_all_recycle_records(conn: &Connection) -> Result<usize> {
    let rows = conn.execute("DELETE FROM inventory_recycle_records", [])?;
    Ok(rows)
}

/// Delete records that do not describe a soft-deleted item
///
/// Removes records whose item is missing or active, and extra records
/// beyond the oldest one for the same item.
pub fn delete_stale_recycle_records(conn: &Connection) -> Result<usize> {
    let orphaned = conn.execute(
        "DELETE FROM inventory_recycle_records
         WHERE item_id NOT IN (SELECT id FROM inventory_items WHERE is_deleted = 1)",
        [],
    )?;
    let duplicates = conn.execute(
        "DELETE FROM inventory_recycle_records
         WHERE id NOT IN (SELECT MIN(id) FROM inventory_recycle_records GROUP BY item_id)",
        [],
    )?;
    Ok(orphaned + duplicates)
}
