//! Spreadsheet state and logic (UI-agnostic).

mod history;
mod io;
mod ops;
mod state;

pub use history::Command;
pub use state::Spreadsheet;
