//! Error types for cellcalc core.

use cellcalc_engine::engine::CellRef;
use thiserror::Error;

/// Errors that can occur while editing, loading or saving a sheet
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("<{element}> is missing the {attribute:?} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid cell name: {0:?}")]
    InvalidCellName(String),

    #[error("Invalid background color: {0:?}")]
    InvalidColor(String),

    #[error("Invalid sheet dimensions: {rows} rows x {columns} columns")]
    InvalidDimensions { rows: usize, columns: usize },

    #[error("Cell {0} is outside the sheet")]
    OutOfBounds(CellRef),

    #[error("No file path set")]
    NoFilePath,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, SheetError>;
