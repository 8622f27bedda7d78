//! Change notifications published by a [`Spreadsheet`](crate::Spreadsheet).

use cellcalc_engine::engine::{CellChange, CellRef};
use serde::Serialize;

/// One change to one cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CellEvent {
    pub cell: CellRef,
    pub change: CellChange,
}

impl CellEvent {
    pub fn new(cell: CellRef, change: CellChange) -> Self {
        CellEvent { cell, change }
    }
}

/// Subscriber callback. Called synchronously, in the order changes happen.
pub type EventCallback = Box<dyn FnMut(&CellEvent)>;
