use super::Spreadsheet;
use crate::config::SheetConfig;
use crate::error::{Result, SheetError};
use crate::storage::{CellRecord, read_xml, write_xml};
use log::info;
use std::path::{Path, PathBuf};

impl Spreadsheet {
    /// Create a sheet and load a file if provided.
    ///
    /// A path that does not exist yet becomes the save target of an empty sheet.
    pub fn with_file(config: &SheetConfig, path: Option<&Path>) -> Result<Self> {
        let mut sheet = Self::new(config)?;
        if let Some(p) = path {
            if p.exists() {
                sheet.load_file(p)?;
            } else {
                sheet.file_path = Some(p.to_path_buf());
                sheet.modified = false;
            }
        }
        Ok(sheet)
    }

    /// Snapshot of every populated cell, row-major.
    pub fn records(&self) -> Vec<CellRecord> {
        self.populated_cells()
            .map(|cell| CellRecord::new(cell.position(), cell.bg_color(), cell.text()))
            .collect()
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(SheetError::NoFilePath);
        };

        let records = self.records();
        write_xml(&path, &records)?;
        self.modified = false;
        info!("Saved {} cells to {}", records.len(), path.display());
        Ok(path)
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Load from file, replacing the whole sheet.
    ///
    /// Every record is parsed and checked against the sheet size before
    /// anything is touched, so a bad file leaves the current sheet as it was.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let records = read_xml(path)?;
        self.load_records(&records)?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        info!("Loaded {} cells from {}", records.len(), path.display());
        Ok(())
    }

    /// Replace the sheet contents with `records`.
    ///
    /// Colors go in first, then texts, both through the ordinary setters so
    /// formulas see their inputs no matter what order the records come in.
    /// Clears undo/redo history.
    pub fn load_records(&mut self, records: &[CellRecord]) -> Result<()> {
        for record in records {
            self.checked_offset(record.cell)?;
        }

        self.clear();
        for record in records {
            self.set_bg_color(record.cell, record.bg_color)?;
        }
        for record in records {
            self.set_text(record.cell, &record.text)?;
        }
        self.clear_history();
        Ok(())
    }
}
