//! Undo/redo over cell edits.
//!
//! Every edit is captured as a [`Command`] holding both the old and the new
//! state, so undo and redo are the same operation pointed in opposite
//! directions. Commands only ever touch cells through the public setters,
//! which means undoing a formula edit recomputes its dependents as usual.

use super::Spreadsheet;
use super::state::MAX_UNDO_STACK;
use crate::error::{Result, SheetError};
use cellcalc_engine::engine::CellRef;

/// A reversible edit.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetText {
        cell: CellRef,
        old: String,
        new: String,
    },
    SetBgColor {
        cell: CellRef,
        old: u32,
        new: u32,
    },
    /// Several edits undone and redone as one step
    Batch(Vec<Command>),
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Command {
    /// Menu label for this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::SetText { .. } => "Change Cell Text",
            Command::SetBgColor { .. } => "Change Cell Color",
            Command::Batch(commands) => commands.first().map_or("Change Cell Color", Command::tag),
        }
    }

    fn cells(&self, out: &mut Vec<CellRef>) {
        match self {
            Command::SetText { cell, .. } | Command::SetBgColor { cell, .. } => out.push(*cell),
            Command::Batch(commands) => {
                for command in commands {
                    command.cells(out);
                }
            }
        }
    }
}

impl Spreadsheet {
    /// Apply a command and record it for undo. Clears the redo stack.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        self.check_command(&command)?;
        self.apply(&command, Direction::Forward)?;
        self.push_undo(command);
        Ok(())
    }

    /// Set a cell's text as an undoable edit.
    pub fn edit_text(&mut self, cell: CellRef, text: &str) -> Result<()> {
        let idx = self.checked_offset(cell)?;
        let old = self.cells[idx].text();
        if old == text {
            return Ok(());
        }
        let command = Command::SetText {
            cell,
            old: old.to_string(),
            new: text.to_string(),
        };
        self.execute(command)
    }

    /// Set a cell's background color as an undoable edit.
    pub fn edit_bg_color(&mut self, cell: CellRef, color: u32) -> Result<()> {
        let idx = self.checked_offset(cell)?;
        let old = self.cells[idx].bg_color();
        if old == color {
            return Ok(());
        }
        self.execute(Command::SetBgColor {
            cell,
            old,
            new: color,
        })
    }

    /// Color several cells as a single undoable edit.
    pub fn edit_bg_color_many(&mut self, cells: &[CellRef], color: u32) -> Result<()> {
        let mut commands = Vec::new();
        for &cell in cells {
            let idx = self.checked_offset(cell)?;
            let old = self.cells[idx].bg_color();
            if old != color {
                commands.push(Command::SetBgColor {
                    cell,
                    old,
                    new: color,
                });
            }
        }
        if commands.is_empty() {
            return Ok(());
        }
        self.execute(Command::Batch(commands))
    }

    /// Undo the last command
    pub fn undo(&mut self) -> Result<()> {
        let command = self.undo_stack.pop().ok_or(SheetError::NothingToUndo)?;
        self.apply(&command, Direction::Backward)?;
        self.redo_stack.push(command);
        Ok(())
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> Result<()> {
        let command = self.redo_stack.pop().ok_or(SheetError::NothingToRedo)?;
        self.apply(&command, Direction::Forward)?;
        self.undo_stack.push(command);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the command `undo` would revert.
    pub fn undo_tag(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Command::tag)
    }

    /// Label of the command `redo` would reapply.
    pub fn redo_tag(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Command::tag)
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_STACK {
            self.undo_stack.remove(0);
        }
    }

    /// Reject a command that touches a cell outside the sheet before any part of it runs.
    fn check_command(&self, command: &Command) -> Result<()> {
        let mut cells = Vec::new();
        command.cells(&mut cells);
        for cell in cells {
            self.checked_offset(cell)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: &Command, direction: Direction) -> Result<()> {
        match command {
            Command::SetText { cell, old, new } => {
                let text = match direction {
                    Direction::Forward => new,
                    Direction::Backward => old,
                };
                self.set_text(*cell, text)
            }
            Command::SetBgColor { cell, old, new } => {
                let color = match direction {
                    Direction::Forward => *new,
                    Direction::Backward => *old,
                };
                self.set_bg_color(*cell, color)
            }
            Command::Batch(commands) => {
                match direction {
                    Direction::Forward => {
                        for command in commands {
                            self.apply(command, direction)?;
                        }
                    }
                    Direction::Backward => {
                        for command in commands.iter().rev() {
                            self.apply(command, direction)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
