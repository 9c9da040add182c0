//! Business logic layer for Inventory Core
//!
//! This module provides the high-level Inventory API for managing
//! items, categories, locations and the recycle bin.

pub mod inventory;
pub mod items;
pub mod categories;
pub mod locations;
pub mod recycle;
pub mod archive;

pub use inventory::Inventory;
pub use recycle::{RepairReport, SkipReason};
