//! Main Inventory API
//!
//! This module provides the primary handle for interacting with an
//! inventory folder: the SQLite database plus the private image folder.

use std::path::{Path, PathBuf};
use log::info;
use crate::error::{InventoryError, Result};
use crate::database::Database;
use crate::{DATABASE_FILENAME, IMAGES_FOLDER};

/// Main inventory interface
///
/// One handle owns one database connection; operations are expected to run
/// one at a time (see [`crate::Session`] for running them off-thread).
#[derive(Debug)]
pub struct Inventory {
    /// Path to the inventory folder
    pub(crate) folder: PathBuf,
    /// Database connection
    pub(crate) db: Database,
}

impl Inventory {
    /// Open an inventory from a folder
    ///
    /// The folder should contain an `inventory.db` file.
    pub fn open(folder: &Path) -> Result<Self> {
        let db_path = folder.join(DATABASE_FILENAME);
        let db = Database::open(&db_path)?;
        std::fs::create_dir_all(folder.join(IMAGES_FOLDER))?;

        info!("event=inventory_open module=inventory status=ok path={}", db_path.display());
        Ok(Self {
            folder: folder.to_path_buf(),
            db,
        })
    }

    /// Create a new inventory in the specified folder
    pub fn create(folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(folder.join(IMAGES_FOLDER))?;

        let db_path = folder.join(DATABASE_FILENAME);
        let db = Database::create(&db_path)?;

        info!("event=inventory_create module=inventory status=ok path={}", db_path.display());
        Ok(Self {
            folder: folder.to_path_buf(),
            db,
        })
    }

    /// Open the inventory in `folder`, creating it when absent
    pub fn open_or_create(folder: &Path) -> Result<Self> {
        if folder.join(DATABASE_FILENAME).exists() {
            Self::open(folder)
        } else {
            Self::create(folder)
        }
    }

    /// Close the inventory
    pub fn close(&mut self) {
        self.db.close();
    }

    /// Get the inventory folder path
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.folder.join(DATABASE_FILENAME)
    }

    /// Folder holding this inventory's item images
    pub fn images_folder(&self) -> PathBuf {
        self.folder.join(IMAGES_FOLDER)
    }

    /// Get a reference to the database
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn conn(&self) -> Result<&rusqlite::Connection> {
        self.db.connection()
    }

    pub(crate) fn conn_mut(&mut self) -> Result<&mut rusqlite::Connection> {
        self.db.connection_mut()
    }
}

impl Drop for Inventory {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reject names that are empty after trimming
pub(crate) fn require_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::InvalidArgument(format!("{} name must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub fn create_test_inventory() -> (Inventory, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let inventory = Inventory::create(temp_dir.path()).unwrap();
        (inventory, temp_dir)
    }

    #[test]
    fn test_create_layout() {
        let (inventory, temp) = create_test_inventory();
        assert_eq!(inventory.folder(), temp.path());
        assert_eq!(inventory.database_path(), temp.path().join("inventory.db"));
        assert!(inventory.database_path().exists());
        assert!(inventory.images_folder().is_dir());
    }

    #[test]
    fn test_open_nonexistent() {
        let result = Inventory::open(Path::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(InventoryError::DatabaseNotFound(_))));
    }

    #[test]
    fn test_open_or_create() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("inv");
        {
            let mut inventory = Inventory::open_or_create(&folder).unwrap();
            inventory.add_location("Garage", "").unwrap();
        }
        let inventory = Inventory::open_or_create(&folder).unwrap();
        assert_eq!(inventory.get_locations().unwrap().len(), 1);
    }

    #[test]
    fn test_close() {
        let (mut inventory, _temp) = create_test_inventory();
        inventory.close();
        assert!(!inventory.database().is_open());
        assert!(inventory.get_items().is_err());
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("  Drill ", "Item").unwrap(), "Drill");
        let err = require_name("   ", "Item").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }
}
