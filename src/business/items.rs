//! Item operations
//!
//! This module provides item management operations for the Inventory.

use rusqlite::Connection;
use log::info;
use crate::error::{InventoryError, Result};
use crate::database::{Item, NewItem, queries};
use crate::utils::generate_item_uuid;
use crate::UNSET_ID;
use super::inventory::{Inventory, require_name};

impl Inventory {
    /// Get all active items
    pub fn get_items(&self) -> Result<Vec<Item>> {
        queries::get_items(self.conn()?, false)
    }

    /// Get all soft-deleted items
    pub fn get_deleted_items(&self) -> Result<Vec<Item>> {
        queries::get_items(self.conn()?, true)
    }

    /// Get an item by row id (any deletion state)
    pub fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
        queries::get_item(self.conn()?, item_id)
    }

    /// Get an item by uuid (any deletion state)
    pub fn get_item_by_uuid(&self, uuid: &str) -> Result<Option<Item>> {
        queries::get_item_by_uuid(self.conn()?, uuid)
    }

    /// Active items stored at a location
    pub fn get_items_by_location(&self, location_id: i64) -> Result<Vec<Item>> {
        queries::get_items_by_location(self.conn()?, location_id)
    }

    /// Active items in a category (top-level or child)
    pub fn get_items_by_category(&self, category_id: i64) -> Result<Vec<Item>> {
        queries::get_items_by_category(self.conn()?, category_id)
    }

    /// Create a new item, returning its row id
    pub fn add_item(&mut self, item: &NewItem) -> Result<i64> {
        let item = normalize_item(item)?;
        let conn = self.conn()?;
        validate_references(conn, &item)?;

        let uuid = generate_item_uuid();
        let id = queries::insert_item(conn, &uuid, &item)?;
        info!("event=item_add module=items status=ok item_id={} uuid={}", id, uuid);
        Ok(id)
    }

    /// Update an item's editable fields (uuid never changes)
    pub fn update_item(&mut self, item_id: i64, item: &NewItem) -> Result<()> {
        let item = normalize_item(item)?;
        let conn = self.conn()?;
        if queries::get_item(conn, item_id)?.is_none() {
            return Err(InventoryError::ItemNotFound(item_id));
        }
        validate_references(conn, &item)?;

        queries::update_item(conn, item_id, &item)?;
        Ok(())
    }

    /// Set the quantity of an item
    pub fn set_item_count(&mut self, item_id: i64, count: i64) -> Result<()> {
        if count < 0 {
            return Err(InventoryError::InvalidArgument(format!("count must not be negative: {}", count)));
        }
        let rows = queries::update_item_count(self.conn()?, item_id, count)?;
        if rows == 0 {
            return Err(InventoryError::ItemNotFound(item_id));
        }
        Ok(())
    }
}

fn normalize_item(item: &NewItem) -> Result<NewItem> {
    let name = require_name(&item.name, "Item")?;
    if item.count < 0 {
        return Err(InventoryError::InvalidArgument(format!("count must not be negative: {}", item.count)));
    }
    if item.valid_time < 0 {
        return Err(InventoryError::InvalidArgument(format!("invalid valid_time: {}", item.valid_time)));
    }
    if item.image_paths.iter().any(|p| p.contains(crate::IMAGE_PATH_SEPARATOR)) {
        return Err(InventoryError::InvalidArgument("image path contains a separator".to_string()));
    }
    Ok(NewItem { name, ..item.clone() })
}

/// Check that non-zero category/location references point at real rows
fn validate_references(conn: &Connection, item: &NewItem) -> Result<()> {
    if item.parent_category_id != UNSET_ID {
        let parent = queries::get_category(conn, item.parent_category_id)?
            .ok_or(InventoryError::CategoryNotFound(item.parent_category_id))?;
        if !parent.is_top_level() {
            return Err(InventoryError::InvalidArgument(format!(
                "category {} is not a top-level category", parent.id
            )));
        }
    }
    if item.child_category_id != UNSET_ID {
        let child = queries::get_category(conn, item.child_category_id)?
            .ok_or(InventoryError::CategoryNotFound(item.child_category_id))?;
        if child.is_top_level() || child.parent_id != item.parent_category_id {
            return Err(InventoryError::InvalidArgument(format!(
                "category {} is not a child of category {}", child.id, item.parent_category_id
            )));
        }
    }
    if item.location_id != UNSET_ID && queries::get_location(conn, item.location_id)?.is_none() {
        return Err(InventoryError::LocationNotFound(item.location_id));
    }
    Ok(())
}
