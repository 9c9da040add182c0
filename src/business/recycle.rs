//! Recycle bin lifecycle
//!
//! An item is in the recycle bin when its `is_deleted` flag is set and
//! exactly one recycle record points at it. Every operation here leaves
//! that pairing intact once it returns:
//!
//! - soft delete writes the record and flips the flag in one transaction
//! - restores flip the flag back and drop the record
//! - batch restore checks each pair on its own and compensates when the
//!   record cannot be removed after the flag was already cleared
//! - stale records (item missing or active) are cleaned whenever the bin is
//!   listed

use std::fs;
use std::io;
use rusqlite::Connection;
use log::{debug, error, info, warn};
use crate::error::{InventoryError, Result};
use crate::database::{Item, ItemState, RecycleRecord, queries};
use super::inventory::Inventory;

/// Why a batch restore pair was not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No recycle record with the given id
    RecordMissing,
    /// The record belongs to a different item than the one paired with it
    ItemMismatch,
    /// The item row no longer exists
    ItemMissing,
    /// The item is not in the recycle bin
    NotDeleted,
    /// The flag update touched no rows
    NoRowsAffected,
    /// The record could not be removed; the item was put back in the bin
    Compensated,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::RecordMissing => "record_missing",
            SkipReason::ItemMismatch => "item_mismatch",
            SkipReason::ItemMissing => "item_missing",
            SkipReason::NotDeleted => "not_deleted",
            SkipReason::NoRowsAffected => "no_rows_affected",
            SkipReason::Compensated => "compensated",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one batch restore pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    Restored,
    Skipped(SkipReason),
}

/// Result of [`Inventory::repair_recycle_bin`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Records removed because their item was missing, active or already covered
    pub removed_stale_records: usize,
    /// Records created for deleted items that had none
    pub created_missing_records: usize,
}

impl Inventory {
    /// Move an item to the recycle bin
    ///
    /// Returns false without changes when the item does not exist or is
    /// already deleted.
    pub fn soft_delete(&mut self, item_id: i64, reason: Option<&str>) -> Result<bool> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        let Some(item) = queries::get_item(&tx, item_id)? else {
            debug!("event=soft_delete module=recycle status=skip item_id={} reason=item_missing", item_id);
            return Ok(false);
        };
        if item.deleted {
            debug!("event=soft_delete module=recycle status=skip item_id={} reason=already_deleted", item_id);
            return Ok(false);
        }

        let record_id = queries::insert_recycle_record(&tx, &item, reason)?;
        queries::set_item_deleted(&tx, item_id, true)?;
        tx.commit()?;

        info!(
            "event=soft_delete module=recycle status=ok item_id={} recycle_id={}",
            item_id, record_id
        );
        Ok(true)
    }

    /// Soft delete several items, returning how many were moved to the bin
    pub fn soft_delete_batch(&mut self, item_ids: &[i64], reason: Option<&str>) -> Result<usize> {
        let mut deleted = 0;
        for &item_id in item_ids {
            if self.soft_delete(item_id, reason)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Restore one item from the recycle bin
    ///
    /// Returns the number of item rows updated: 0 when the item is missing
    /// or not deleted.
    pub fn restore_one(&mut self, item_id: i64) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        match queries::get_item(&tx, item_id)? {
            Some(item) if item.deleted => {}
            _ => {
                debug!("event=restore_one module=recycle status=skip item_id={}", item_id);
                return Ok(0);
            }
        }

        let rows = queries::set_item_deleted(&tx, item_id, false)?;
        let records = queries::delete_recycle_records_for_item(&tx, item_id)?;
        tx.commit()?;

        info!(
            "event=restore_one module=recycle status=ok item_id={} records_removed={}",
            item_id, records
        );
        Ok(rows)
    }

    /// Restore (recycle id, item id) pairs, returning how many succeeded
    ///
    /// The whole batch runs inside one storage transaction, with a savepoint
    /// per pair. Pairs are checked in order; a pair whose record is missing
    /// or points at a different item, whose item is missing or active, or
    /// whose writes fail is skipped without stopping the rest. A pair whose
    /// compensation also fails is rolled back to where it started. Only
    /// empty or mismatched input lists fail the call.
    pub fn restore_batch(&mut self, recycle_ids: &[i64], item_ids: &[i64]) -> Result<usize> {
        if recycle_ids.is_empty() || item_ids.is_empty() {
            return Err(InventoryError::InvalidArgument("restore batch must not be empty".to_string()));
        }
        if recycle_ids.len() != item_ids.len() {
            return Err(InventoryError::InvalidArgument(format!(
                "restore batch length mismatch: {} recycle ids, {} item ids",
                recycle_ids.len(),
                item_ids.len()
            )));
        }

        let conn = self.conn_mut()?;
        let mut tx = conn.transaction()?;

        let mut restored = 0;
        for (&recycle_id, &item_id) in recycle_ids.iter().zip(item_ids) {
            // each pair commits or rolls back on its own
            let savepoint = tx.savepoint()?;
            match restore_pair(&savepoint, recycle_id, item_id) {
                Ok(outcome) => {
                    savepoint.commit()?;
                    match outcome {
                        PairOutcome::Restored => restored += 1,
                        PairOutcome::Skipped(reason) => debug!(
                            "event=restore_batch_pair module=recycle status=skip recycle_id={} item_id={} reason={}",
                            recycle_id, item_id, reason
                        ),
                    }
                }
                Err(err) => {
                    drop(savepoint);
                    warn!(
                        "event=restore_batch_pair module=recycle status=rollback recycle_id={} item_id={} error={}",
                        recycle_id, item_id, err
                    );
                }
            }
        }
        tx.commit()?;

        info!(
            "event=restore_batch module=recycle status=ok requested={} restored={}",
            recycle_ids.len(),
            restored
        );
        Ok(restored)
    }

    /// Permanently delete an item row
    ///
    /// The item's recycle record is not touched; pair this with
    /// [`Inventory::delete_recycle_record`] or use
    /// [`Inventory::purge_recycled`].
    pub fn purge_one(&mut self, item_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let Some(item) = queries::get_item(conn, item_id)? else {
            return Ok(0);
        };
        let rows = queries::delete_item(conn, item_id)?;
        self.remove_private_images(std::slice::from_ref(&item));
        info!("event=purge_one module=recycle status=ok item_id={} rows={}", item_id, rows);
        Ok(rows)
    }

    /// Permanently delete several item rows in one transaction
    pub fn purge_batch(&mut self, item_ids: &[i64]) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;
        let mut purged = Vec::new();
        for &item_id in item_ids {
            if let Some(item) = queries::get_item(&tx, item_id)? {
                queries::delete_item(&tx, item_id)?;
                purged.push(item);
            }
        }
        tx.commit()?;
        let rows = purged.len();
        self.remove_private_images(&purged);

        info!("event=purge_batch module=recycle status=ok requested={} rows={}", item_ids.len(), rows);
        Ok(rows)
    }

    /// Delete one recycle record by id
    pub fn delete_recycle_record(&mut self, recycle_id: i64) -> Result<usize> {
        queries::delete_recycle_record(self.conn()?, recycle_id)
    }

    /// Permanently delete soft-deleted items together with their records
    ///
    /// Active items in the list are left alone. Returns the number of item
    /// rows removed.
    pub fn purge_recycled(&mut self, item_ids: &[i64]) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;
        let mut items = Vec::new();
        for &item_id in item_ids {
            match queries::get_item(&tx, item_id)? {
                Some(item) if item.deleted => {
                    queries::delete_recycle_records_for_item(&tx, item_id)?;
                    queries::delete_item(&tx, item_id)?;
                    items.push(item);
                }
                _ => debug!("event=purge_recycled module=recycle status=skip item_id={}", item_id),
            }
        }
        tx.commit()?;
        let purged = items.len();
        self.remove_private_images(&items);

        info!("event=purge_recycled module=recycle status=ok requested={} purged={}", item_ids.len(), purged);
        Ok(purged)
    }

    /// Permanently delete everything in the recycle bin
    pub fn empty_recycle_bin(&mut self) -> Result<usize> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;
        let items = queries::get_items(&tx, true)?;
        let purged = queries::delete_deleted_items(&tx)?;
        queries::delete_all_recycle_records(&tx)?;
        tx.commit()?;
        self.remove_private_images(&items);

        info!("event=empty_recycle_bin module=recycle status=ok purged={}", purged);
        Ok(purged)
    }

    /// List the recycle bin, newest first
    ///
    /// Records that no longer describe a deleted item are removed first.
    pub fn list_recycle_bin(&mut self) -> Result<Vec<RecycleRecord>> {
        let conn = self.conn()?;
        let stale = queries::delete_stale_recycle_records(conn)?;
        if stale > 0 {
            warn!("event=recycle_cleanup module=recycle status=ok stale_records={}", stale);
        }
        queries::get_recycle_records(conn)
    }

    /// Lifecycle state of an item, or None when the item does not exist
    pub fn item_state(&self, item_id: i64) -> Result<Option<ItemState>> {
        let conn = self.conn()?;
        let Some(item) = queries::get_item(conn, item_id)? else {
            return Ok(None);
        };
        if !item.deleted {
            return Ok(Some(ItemState::Active));
        }
        Ok(Some(match queries::get_recycle_record_for_item(conn, item_id)? {
            Some(record) => ItemState::Deleted(record),
            None => ItemState::Orphaned,
        }))
    }

    /// Bring the recycle bin back in line with the item flags
    ///
    /// Meant for quiescent stores: an in-flight delete would otherwise get a
    /// record written on its behalf.
    pub fn repair_recycle_bin(&mut self) -> Result<RepairReport> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        let removed_stale_records = queries::delete_stale_recycle_records(&tx)?;
        let orphans = queries::get_deleted_items_without_record(&tx)?;
        for item in &orphans {
            queries::insert_recycle_record(&tx, item, None)?;
        }
        tx.commit()?;

        let report = RepairReport {
            removed_stale_records,
            created_missing_records: orphans.len(),
        };
        info!(
            "event=recycle_repair module=recycle status=ok removed={} created={}",
            report.removed_stale_records, report.created_missing_records
        );
        Ok(report)
    }
}

impl Inventory {
    /// Delete image files of purged items that live in the inventory's own image folder
    ///
    /// Paths outside that folder belong to the user and are left alone.
    fn remove_private_images(&self, items: &[Item]) {
        let images_folder = self.images_folder();
        for item in items {
            for path in &item.image_paths {
                let path = std::path::Path::new(path);
                if path.parent() != Some(images_folder.as_path()) {
                    continue;
                }
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => warn!(
                        "event=purge_image module=recycle status=error item_id={} path={} error={}",
                        item.id, path.display(), err
                    ),
                }
            }
        }
    }
}

fn restore_pair(conn: &Connection, recycle_id: i64, item_id: i64) -> Result<PairOutcome> {
    let Some(record) = queries::get_recycle_record(conn, recycle_id)? else {
        return Ok(PairOutcome::Skipped(SkipReason::RecordMissing));
    };
    if record.item_id != item_id {
        return Ok(PairOutcome::Skipped(SkipReason::ItemMismatch));
    }

    match queries::get_item(conn, item_id)? {
        None => return Ok(PairOutcome::Skipped(SkipReason::ItemMissing)),
        Some(item) if !item.deleted => return Ok(PairOutcome::Skipped(SkipReason::NotDeleted)),
        Some(_) => {}
    }

    if queries::set_item_deleted(conn, item_id, false)? == 0 {
        return Ok(PairOutcome::Skipped(SkipReason::NoRowsAffected));
    }

    match queries::delete_recycle_record(conn, recycle_id) {
        Ok(rows) if rows > 0 => Ok(PairOutcome::Restored),
        outcome => {
            if let Err(err) = &outcome {
                warn!(
                    "event=restore_batch_pair module=recycle status=compensate recycle_id={} item_id={} error={}",
                    recycle_id, item_id, err
                );
            }
            if let Err(err) = queries::set_item_deleted(conn, item_id, true) {
                error!(
                    "event=restore_batch_pair module=recycle status=compensation_failed recycle_id={} item_id={} error={}",
                    recycle_id, item_id, err
                );
                return Err(err);
            }
            Ok(PairOutcome::Skipped(SkipReason::Compensated))
        }
    }
}
