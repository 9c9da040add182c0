//! # Inventory Core
//!
//! Local inventory tracking library with a recycle bin and portable archives.
//!
//! ## Features
//!
//! - SQLite storage for items, categories, locations and recycle records
//! - Soft delete with single and batch restore
//! - Export of the whole inventory (with item images) to a ZIP archive
//! - Import with deduplication against existing data
//! - Serialized background session for running operations off-thread
//!
//! ## Example
//!
//! ```no_run
//! use invcore::{Inventory, NewItem, ExportOptions};
//! use std::path::Path;
//!
//! let mut inventory = Inventory::open_or_create(Path::new("/path/to/inventory")).unwrap();
//! let item_id = inventory.add_item(&NewItem::named("Drill")).unwrap();
//!
//! inventory.soft_delete(item_id, Some("broken")).unwrap();
//! inventory.restore_one(item_id).unwrap();
//!
//! inventory.export_archive(Path::new("/tmp/inventory.zip"), &ExportOptions::default()).unwrap();
//! ```

pub mod archive;
pub mod business;
pub mod database;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

// Re-export main types
pub use error::{ErrorKind, InventoryError, Result};
pub use database::models::{Category, Item, ItemState, Location, NewItem, RecycleRecord};
pub use business::{Inventory, RepairReport};
pub use archive::{ExportOptions, ExportSummary, ImportReport};
pub use session::{Pending, Session};

/// Database schema version
pub const DB_VERSION: i32 = 1;

/// Database filename inside an inventory folder
pub const DATABASE_FILENAME: &str = "inventory.db";

/// Private image folder inside an inventory folder
pub const IMAGES_FOLDER: &str = "images";

/// Name of the JSON entry inside an archive
pub const ARCHIVE_DATA_ENTRY: &str = "inventory.json";

/// Namespace for image entries inside an archive
pub const ARCHIVE_IMAGES_PREFIX: &str = "images/";

/// Name prefix of the scratch folder an import unpacks into
pub const IMPORT_SCRATCH_PREFIX: &str = ".import-";

/// Separator used when image paths are stored or exported as one string
pub const IMAGE_PATH_SEPARATOR: char = ',';

/// Id value meaning "no category / no location"
pub const UNSET_ID: i64 = 0;
