//! Cell data for the spreadsheet grid.
//!
//! - [`Cell`] - fixed coordinates plus the user's text, the displayed value
//!   and a background color
//! - [`CellChange`] - the closed set of change notifications a cell emits
//!
//! Setters short-circuit when the new value equals the old one and report
//! whether anything changed, so callers only publish real changes.

use serde::{Deserialize, Serialize};

use super::cell_ref::CellRef;

/// Opaque white, the color of an untouched cell.
pub const DEFAULT_BG_COLOR: u32 = 0xFFFF_FFFF;

/// Display value of a formula that cannot be evaluated.
pub const ERROR_VALUE: &str = "ERROR";

/// What changed about a cell.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum CellChange {
    /// The raw text typed by the user.
    Text,
    /// The displayed value.
    Value,
    /// One of the cells this cell reads from changed its value.
    Reference,
    /// The background color.
    BgColor,
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    position: CellRef,
    text: String,
    value: String,
    bg_color: u32,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Cell {
        Cell {
            position: CellRef::new(col, row),
            text: String::new(),
            value: String::new(),
            bg_color: DEFAULT_BG_COLOR,
        }
    }

    pub fn position(&self) -> CellRef {
        self.position
    }

    pub fn row(&self) -> usize {
        self.position.row
    }

    pub fn col(&self) -> usize {
        self.position.col
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn bg_color(&self) -> u32 {
        self.bg_color
    }

    /// True if the text starts with `=`.
    pub fn is_formula(&self) -> bool {
        self.text.starts_with('=')
    }

    /// True if the cell differs from a freshly created one in a way worth saving.
    pub fn is_populated(&self) -> bool {
        !self.text.is_empty() || self.bg_color != DEFAULT_BG_COLOR
    }

    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        true
    }

    pub fn set_value(&mut self, value: &str) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value.to_string();
        true
    }

    pub fn set_bg_color(&mut self, color: u32) -> bool {
        if self.bg_color == color {
            return false;
        }
        self.bg_color = color;
        true
    }

    /// Reset text, value and color, keeping the coordinates.
    pub fn reset(&mut self) {
        self.text.clear();
        self.value.clear();
        self.bg_color = DEFAULT_BG_COLOR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_blank() {
        let cell = Cell::new(4, 2);
        assert_eq!(cell.row(), 4);
        assert_eq!(cell.col(), 2);
        assert_eq!(cell.position(), CellRef::new(2, 4));
        assert_eq!(cell.text(), "");
        assert_eq!(cell.value(), "");
        assert_eq!(cell.bg_color(), DEFAULT_BG_COLOR);
        assert!(!cell.is_populated());
    }

    #[test]
    fn test_setters_report_changes_only() {
        let mut cell = Cell::new(0, 0);
        assert!(cell.set_text("hello"));
        assert!(!cell.set_text("hello"));
        assert!(cell.set_value("hello"));
        assert!(!cell.set_value("hello"));
        assert!(cell.set_bg_color(0xFF00_00FF));
        assert!(!cell.set_bg_color(0xFF00_00FF));
    }

    #[test]
    fn test_populated_by_color_alone() {
        let mut cell = Cell::new(0, 0);
        cell.set_bg_color(1);
        assert!(cell.is_populated());
        cell.reset();
        assert!(!cell.is_populated());
    }

    #[test]
    fn test_is_formula() {
        let mut cell = Cell::new(0, 0);
        cell.set_text("=A2");
        assert!(cell.is_formula());
        cell.set_text("A2=");
        assert!(!cell.is_formula());
    }
}
