//! Character classification and variable extraction for formulas.
//!
//! A formula (already stripped of its leading `=`) may only contain the
//! operators `+ - * / ^`, uppercase letters, digits, `.`, parentheses and
//! spaces. Anything else rejects the formula before it is parsed.
//!
//! Variables are the cell-reference-shaped tokens: a run of uppercase letters
//! followed by any digits. They are returned in order of occurrence and are
//! not deduplicated by name, so `A1+A1` yields two entries.

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::error::{FormulaError, FormulaResult};

pub fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '^')
}

pub fn is_parenthesis(c: char) -> bool {
    matches!(c, '(' | ')')
}

pub fn is_upper(c: char) -> bool {
    c.is_ascii_uppercase()
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_allowed(c: char) -> bool {
    is_operator(c) || is_parenthesis(c) || is_upper(c) || is_digit(c) || c == '.' || c == ' '
}

/// Return the first character outside the formula alphabet, if any.
pub fn find_prohibited_character(expression: &str) -> Option<char> {
    expression.chars().find(|&c| !is_allowed(c))
}

pub fn contains_prohibited_characters(expression: &str) -> bool {
    find_prohibited_character(expression).is_some()
}

/// Reject a formula containing characters outside the grammar.
pub fn check_characters(expression: &str) -> FormulaResult<()> {
    match find_prohibited_character(expression) {
        Some(c) => Err(FormulaError::ProhibitedCharacter(c)),
        None => Ok(()),
    }
}

/// Extract every variable token in order of occurrence.
pub fn extract_variables(expression: &str) -> Vec<String> {
    variable_re()
        .find_iter(expression)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Map each variable of a formula to an in-bounds cell.
///
/// All-or-nothing: the first token that is not a valid single-letter
/// reference inside a `rows` x `columns` grid fails the whole formula.
pub fn resolve_variables(
    expression: &str,
    rows: usize,
    columns: usize,
) -> FormulaResult<Vec<(String, CellRef)>> {
    extract_variables(expression)
        .into_iter()
        .map(|name| match CellRef::resolve(&name, rows, columns) {
            Some(cell) => Ok((name, cell)),
            None => Err(FormulaError::UnresolvedReference(name)),
        })
        .collect()
}

fn variable_re() -> &'static Regex {
    static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();
    VARIABLE_RE
        .get_or_init(|| Regex::new(r"[A-Z]+[0-9]*").expect("variable token regex must compile"))
}
