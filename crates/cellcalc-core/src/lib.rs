//! cellcalc-core - UI-agnostic spreadsheet model, recalculation and storage.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod storage;

pub use config::SheetConfig;
pub use document::{Command, Spreadsheet};
pub use error::{Result, SheetError};
pub use events::{CellEvent, EventCallback};

pub use cellcalc_engine::engine::{Cell, CellChange, CellRef};
