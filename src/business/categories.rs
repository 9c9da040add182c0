//! Category operations
//!
//! Categories have two levels. Names are unique among siblings, and a
//! deleted category is unlinked from items rather than deleting them.

use log::info;
use crate::error::{InventoryError, Result};
use crate::database::{Category, queries};
use crate::UNSET_ID;
use super::inventory::{Inventory, require_name};

impl Inventory {
    /// Get all categories, top-level first
    pub fn get_categories(&self) -> Result<Vec<Category>> {
        queries::get_categories(self.conn()?)
    }

    /// Get top-level categories
    pub fn get_top_level_categories(&self) -> Result<Vec<Category>> {
        queries::get_categories_by_parent(self.conn()?, UNSET_ID)
    }

    /// Get child categories of a top-level category
    pub fn get_child_categories(&self, parent_id: i64) -> Result<Vec<Category>> {
        queries::get_categories_by_parent(self.conn()?, parent_id)
    }

    /// Get a category by id
    pub fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        queries::get_category(self.conn()?, category_id)
    }

    /// Create a category; `parent_id = 0` creates a top-level one
    pub fn add_category(&mut self, name: &str, parent_id: i64) -> Result<i64> {
        let name = require_name(name, "Category")?;
        let conn = self.conn()?;

        if parent_id != UNSET_ID {
            let parent = queries::get_category(conn, parent_id)?
                .ok_or(InventoryError::CategoryNotFound(parent_id))?;
            if !parent.is_top_level() {
                return Err(InventoryError::InvalidArgument(format!(
                    "category {} cannot have children", parent_id
                )));
            }
        }
        if queries::find_category(conn, &name, parent_id)?.is_some() {
            return Err(InventoryError::DuplicateName(name));
        }

        let id = queries::insert_category(conn, &name, parent_id)?;
        info!("event=category_add module=categories status=ok category_id={} parent_id={}", id, parent_id);
        Ok(id)
    }

    /// Rename a category, keeping names unique among its siblings
    pub fn rename_category(&mut self, category_id: i64, name: &str) -> Result<()> {
        let name = require_name(name, "Category")?;
        let conn = self.conn()?;

        let category = queries::get_category(conn, category_id)?
            .ok_or(InventoryError::CategoryNotFound(category_id))?;
        if let Some(existing) = queries::find_category(conn, &name, category.parent_id)? {
            if existing.id != category_id {
                return Err(InventoryError::DuplicateName(name));
            }
        }

        queries::rename_category(conn, category_id, &name)?;
        Ok(())
    }

    /// Delete a category, returning how many category rows were removed
    ///
    /// Deleting a top-level category also deletes its children. Items that
    /// referenced any removed category keep existing with the reference
    /// reset to 0. Deleting a missing category is a no-op.
    pub fn delete_category(&mut self, category_id: i64) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        let Some(category) = queries::get_category(&tx, category_id)? else {
            return Ok(0);
        };

        let mut doomed = Vec::new();
        if category.is_top_level() {
            doomed.extend(queries::get_categories_by_parent(&tx, category_id)?.into_iter().map(|c| c.id));
        }
        doomed.push(category_id);

        let mut removed = 0;
        let mut unlinked = 0;
        for id in &doomed {
            unlinked += queries::clear_category_references(&tx, *id)?;
            removed += queries::delete_category(&tx, *id)?;
        }
        tx.commit()?;

        info!(
            "event=category_delete module=categories status=ok category_id={} removed={} items_unlinked={}",
            category_id, removed, unlinked
        );
        Ok(removed)
    }
}
