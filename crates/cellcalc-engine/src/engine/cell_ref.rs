//! Cell reference parsing and formatting.
//!
//! Converts between spreadsheet-style references ("A1", "Z23") and
//! zero-indexed row/column coordinates. Columns are a single uppercase
//! letter, so a sheet has at most [`MAX_COLUMNS`] columns; rows are written
//! 1-based and stored 0-based.
//!
//! # Examples
//!
//! ```
//! use cellcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of addressable columns (`A` through `Z`).
pub const MAX_COLUMNS: usize = 26;

/// A reference to a cell by row and column indices (0-indexed).
///
/// Ordering is row-major, which is the order cells are listed and saved in.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference such as "A1" or "Z23".
    /// Returns None for multi-letter columns, lowercase letters, a zero row,
    /// or anything else that is not `LETTER DIGITS`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let letter = caps["letter"].as_bytes()[0];
        let col = (letter - b'A') as usize;
        let row = caps["digits"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Parse a reference and check it against the sheet dimensions.
    pub fn resolve(name: &str, rows: usize, columns: usize) -> Option<CellRef> {
        Self::parse_a1(name).filter(|cell| cell.in_bounds(rows, columns))
    }

    pub fn in_bounds(&self, rows: usize, columns: usize) -> bool {
        self.row < rows && self.col < columns
    }

    /// Convert a column index to its letter (0 -> A, 25 -> Z).
    pub fn col_to_letter(col: usize) -> Option<char> {
        if col < MAX_COLUMNS {
            Some((b'A' + col as u8) as char)
        } else {
            None
        }
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letter>[A-Z])(?<digits>[0-9]+)$").expect("cell reference regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CellRef::col_to_letter(self.col) {
            Some(letter) => write!(f, "{}{}", letter, self.row + 1),
            None => write!(f, "#{}:{}", self.col, self.row + 1),
        }
    }
}
