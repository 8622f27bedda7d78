//! Formula engine API.
//!
//! This module provides the computation core for the spreadsheet:
//!
//! - [`Cell`], [`CellChange`] - Cell data and change kinds
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`extract_variables`], [`check_characters`] - Formula scanning
//! - [`to_postfix`] - Infix to postfix conversion
//! - [`ExprTree`], [`Node`] - Compiled expression trees
//! - [`DepGraph`] - Reference/dependent edges between cells
//! - [`detect_cycle`] - Circular reference detection
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod format;
mod graph;
mod postfix;
mod tree;

pub use cell::{Cell, CellChange, DEFAULT_BG_COLOR, ERROR_VALUE};
pub use cell_ref::{CellRef, MAX_COLUMNS};
pub use cycle::{detect_cycle, is_in_cycle};
pub use deps::{
    check_characters, contains_prohibited_characters, extract_variables,
    find_prohibited_character, resolve_variables,
};
pub use error::{FormulaError, FormulaResult};
pub use format::{format_number, parse_number};
pub use graph::DepGraph;
pub use postfix::{Associativity, OPERAND_DELIMITER, Operator, condense, to_postfix};
pub use tree::{Bindings, ExprTree, MAX_TREE_DEPTH, Node, compile_postfix};
