//! Database schema definitions

/// SQL to create the categories table
///
/// `parent_id = 0` marks a top-level category.
pub const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_categories (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id       INTEGER NOT NULL DEFAULT 0,
    name            TEXT NOT NULL,
    create_time     TEXT,
    update_time     TEXT
)
"#;

/// Category names are unique among siblings
pub const CREATE_CATEGORIES_NAME_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_parent_name
    ON inventory_categories (parent_id, name)
"#;

/// SQL to create the locations table
pub const CREATE_LOCATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_locations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL UNIQUE,
    remark          TEXT NOT NULL DEFAULT '',
    create_time     TEXT,
    update_time     TEXT
)
"#;

/// SQL to create the items table
pub const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid                TEXT NOT NULL UNIQUE,
    name                TEXT NOT NULL,
    parent_category_id  INTEGER NOT NULL DEFAULT 0,
    child_category_id   INTEGER NOT NULL DEFAULT 0,
    location_id         INTEGER NOT NULL DEFAULT 0,
    valid_time          INTEGER NOT NULL DEFAULT 0,
    count               INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
    image_paths         TEXT NOT NULL DEFAULT '',
    remark              TEXT NOT NULL DEFAULT '',
    create_time         TEXT,
    update_time         TEXT,
    is_deleted          INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the recycle records table
pub const CREATE_RECYCLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_recycle_records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id         INTEGER NOT NULL,
    item_uuid       TEXT NOT NULL,
    item_name       TEXT NOT NULL,
    delete_time     TEXT,
    delete_reason   TEXT
)
"#;

/// Lookup of recycle records by item
pub const CREATE_RECYCLE_ITEM_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_recycle_item_id
    ON inventory_recycle_records (item_id)
"#;

/// All table creation statements in order
pub const CREATE_ALL_TABLES: &[&str] = &[
    CREATE_CATEGORIES_TABLE,
    CREATE_CATEGORIES_NAME_INDEX,
    CREATE_LOCATIONS_TABLE,
    CREATE_ITEMS_TABLE,
    CREATE_RECYCLE_TABLE,
    CREATE_RECYCLE_ITEM_INDEX,
];
