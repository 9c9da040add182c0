//! Database layer for Inventory Core
//!
//! Handles SQLite database operations including:
//! - Schema creation
//! - CRUD operations for items, categories, locations
//! - Recycle record storage

pub mod models;
pub mod schema;
pub mod connection;
pub mod queries;

pub use connection::Database;
pub use models::*;
