//! Archive export/import entry points

use std::path::Path;
use crate::archive::{self, ExportOptions, ExportSummary, ImportReport};
use crate::error::Result;
use super::inventory::Inventory;

impl Inventory {
    /// Export the inventory (with item images) to a ZIP archive at `destination`
    ///
    /// Any file already at `destination` is replaced.
    pub fn export_archive(&self, destination: &Path, options: &ExportOptions) -> Result<ExportSummary> {
        archive::export::write_archive(self.conn()?, destination, options)
    }

    /// Merge an archive produced by [`Inventory::export_archive`] into this inventory
    pub fn import_archive(&mut self, archive_path: &Path) -> Result<ImportReport> {
        let images_folder = self.images_folder();
        let scratch_root = self.folder.clone();
        archive::import::read_archive(self.conn_mut()?, archive_path, &scratch_root, &images_folder)
    }
}
