//! Location operations

use log::info;
use crate::error::{InventoryError, Result};
use crate::database::{Location, queries};
use super::inventory::{Inventory, require_name};

impl Inventory {
    /// Get all locations ordered by name
    pub fn get_locations(&self) -> Result<Vec<Location>> {
        queries::get_locations(self.conn()?)
    }

    /// Get a location by id
    pub fn get_location(&self, location_id: i64) -> Result<Option<Location>> {
        queries::get_location(self.conn()?, location_id)
    }

    /// Create a location with a globally unique name
    pub fn add_location(&mut self, name: &str, remark: &str) -> Result<i64> {
        let name = require_name(name, "Location")?;
        let conn = self.conn()?;
        if queries::find_location(conn, &name)?.is_some() {
            return Err(InventoryError::DuplicateName(name));
        }
        let id = queries::insert_location(conn, &name, remark)?;
        info!("event=location_add module=locations status=ok location_id={}", id);
        Ok(id)
    }

    /// Update a location's name and remark
    pub fn update_location(&mut self, location_id: i64, name: &str, remark: &str) -> Result<()> {
        let name = require_name(name, "Location")?;
        let conn = self.conn()?;
        if let Some(existing) = queries::find_location(conn, &name)? {
            if existing.id != location_id {
                return Err(InventoryError::DuplicateName(name));
            }
        }
        if queries::update_location(conn, location_id, &name, remark)? == 0 {
            return Err(InventoryError::LocationNotFound(location_id));
        }
        Ok(())
    }

    /// Delete a location; items stored there get `location_id = 0`
    pub fn delete_location(&mut self, location_id: i64) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;
        let unlinked = queries::clear_location_references(&tx, location_id)?;
        let removed = queries::delete_location(&tx, location_id)?;
        tx.commit()?;

        info!(
            "event=location_delete module=locations status=ok location_id={} removed={} items_unlinked={}",
            location_id, removed, unlinked
        );
        Ok(removed)
    }
}
