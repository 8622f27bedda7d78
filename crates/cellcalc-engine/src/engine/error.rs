//! Error types for formula compilation and resolution.

use std::num::ParseFloatError;

use thiserror::Error;

/// Reasons a formula cannot produce a number.
///
/// None of these escape the spreadsheet: the orchestrator turns every
/// variant into the `ERROR` display value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Prohibited character in formula: {0:?}")]
    ProhibitedCharacter(char),

    #[error("Invalid number: {token}")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Operator is missing an operand")]
    MissingOperand,

    #[error("Expression has operands without an operator")]
    DanglingOperand,

    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Unresolved cell reference: {0}")]
    UnresolvedReference(String),
}

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;
