//! Database connection management

use std::path::{Path, PathBuf};
use rusqlite::Connection;
use crate::error::{InventoryError, Result};
use crate::DB_VERSION;
use super::schema;

/// Database connection wrapper
#[derive(Debug)]
pub struct Database {
    /// Path to the database file
    path: PathBuf,
    /// SQLite connection
    conn: Option<Connection>,
}

impl Database {
    /// Open an existing database at the specified path
    ///
    /// Missing tables are created, so databases written by older builds
    /// remain usable.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InventoryError::DatabaseNotFound(
                path.to_string_lossy().to_string(),
            ));
        }
        let conn = Connection::open(path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Create a new database with all tables
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| {
            InventoryError::DatabaseError("Database not open".to_string())
        })
    }

    /// Get a mutable reference to the connection
    pub fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or_else(|| {
            InventoryError::DatabaseError("Database not open".to_string())
        })
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the database connection
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Schema version recorded in the database header
    pub fn schema_version(&self) -> Result<i32> {
        let version = self
            .connection()?
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    for sql in schema::CREATE_ALL_TABLES {
        conn.execute(sql, [])?;
    }
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version == 0 {
        conn.execute_batch(&format!("PRAGMA user_version = {}", DB_VERSION))?;
    }
    Ok(())
}
