use crate::config::{DEFAULT_COLUMNS, DEFAULT_ROWS, SheetConfig};
use crate::error::{Result, SheetError};
use crate::events::{CellEvent, EventCallback};
use cellcalc_engine::engine::{Cell, CellChange, CellRef, DepGraph, is_in_cycle};
use log::trace;
use std::path::PathBuf;

use super::history::Command;

/// Maximum number of undo entries to keep
pub(crate) const MAX_UNDO_STACK: usize = 100;

/// UI-agnostic spreadsheet: a fixed grid of cells plus the machinery that
/// keeps every formula's value current.
pub struct Spreadsheet {
    /// Row-major cell storage, `rows * columns` long
    pub(crate) cells: Vec<Cell>,
    pub(crate) rows: usize,
    pub(crate) columns: usize,
    /// Reference edges of every accepted formula
    pub(crate) graph: DepGraph,
    pub(crate) subscribers: Vec<EventCallback>,
    /// Undo stack
    pub(crate) undo_stack: Vec<Command>,
    /// Redo stack
    pub(crate) redo_stack: Vec<Command>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the sheet has been modified since it was loaded or saved
    pub modified: bool,
}

impl Spreadsheet {
    /// Create an empty sheet with the configured dimensions.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(config: &SheetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.rows, config.columns))
    }

    /// Create an empty sheet of `rows` x `columns` cells.
    pub fn with_size(rows: usize, columns: usize) -> Result<Self> {
        Self::new(&SheetConfig::new(rows, columns))
    }

    fn build(rows: usize, columns: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for col in 0..columns {
                cells.push(Cell::new(row, col));
            }
        }
        Spreadsheet {
            cells,
            rows,
            columns,
            graph: DepGraph::new(),
            subscribers: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            file_path: None,
            modified: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.in_bounds(self.rows, self.columns)
    }

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.offset(cell).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cell(CellRef::new(col, row))
    }

    /// Name of a cell in A1 notation, e.g. "B3".
    pub fn cell_name(&self, cell: CellRef) -> String {
        cell.to_string()
    }

    /// Cells with text or a non-default color, row-major.
    pub fn populated_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|cell| cell.is_populated())
    }

    /// Cells the formula in `cell` currently reads.
    pub fn references(&self, cell: CellRef) -> Vec<CellRef> {
        self.graph.references(cell).collect()
    }

    /// Cells whose formulas currently read `cell`.
    pub fn dependents(&self, cell: CellRef) -> Vec<CellRef> {
        self.graph.dependents(cell).collect()
    }

    pub fn is_in_cycle(&self, cell: CellRef) -> bool {
        is_in_cycle(cell, &self.graph)
    }

    /// Register a callback for every cell change.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&CellEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub(crate) fn offset(&self, cell: CellRef) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row * self.columns + cell.col)
        } else {
            None
        }
    }

    pub(crate) fn checked_offset(&self, cell: CellRef) -> Result<usize> {
        self.offset(cell).ok_or(SheetError::OutOfBounds(cell))
    }

    pub(crate) fn emit(&mut self, cell: CellRef, change: CellChange) {
        trace!("{} {:?}", cell, change);
        let event = CellEvent::new(cell, change);
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::build(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }
}
