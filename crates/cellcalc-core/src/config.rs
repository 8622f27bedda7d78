//! Sheet dimensions.

use cellcalc_engine::engine::MAX_COLUMNS;
use serde::Deserialize;

use crate::error::{Result, SheetError};

pub const DEFAULT_ROWS: usize = 50;
pub const DEFAULT_COLUMNS: usize = MAX_COLUMNS;
/// Largest row count a sheet may be built with.
pub const MAX_ROWS: usize = 1_048_576;

/// Size of the grid a [`Spreadsheet`](crate::Spreadsheet) is built with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub rows: usize,
    pub columns: usize,
}

impl SheetConfig {
    pub fn new(rows: usize, columns: usize) -> Self {
        SheetConfig { rows, columns }
    }

    /// At least one cell, no more columns than there are letters, and no
    /// more than [`MAX_ROWS`] rows.
    pub fn validate(&self) -> Result<()> {
        let too_many = self.rows > MAX_ROWS || self.rows.checked_mul(self.columns).is_none();
        if self.rows == 0 || self.columns == 0 || self.columns > MAX_COLUMNS || too_many {
            return Err(SheetError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}
