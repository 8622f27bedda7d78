//! Infix to postfix conversion (shunting yard).
//!
//! The postfix form is a plain string: operators are single characters and
//! every operand (constant or variable) is followed by [`OPERAND_DELIMITER`],
//! so `2+3*4` becomes `2|3|4|*+`. The tree compiler relies on the delimiter to
//! find where a multi-character operand ends.

use super::deps::{is_operator, is_parenthesis};
use super::error::{FormulaError, FormulaResult};

/// Terminates each operand in a postfix string. Never valid inside a formula.
pub const OPERAND_DELIMITER: char = '|';

/// Binary operators understood by the engine.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Associativity {
    Left,
    Right,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Power => '^',
        }
    }

    /// Binding strength. `-` deliberately ranks one step above `+`.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add => 6,
            Operator::Subtract => 7,
            Operator::Multiply | Operator::Divide => 8,
            Operator::Power => 10,
        }
    }

    pub fn associativity(self) -> Associativity {
        match self {
            Operator::Power => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// IEEE-754 arithmetic: division by zero yields an infinity or NaN.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Power => left.powf(right),
        }
    }

    /// True if `self`, already on the stack, must be emitted before `incoming` is pushed.
    fn binds_before(self, incoming: Operator) -> bool {
        self.precedence() > incoming.precedence()
            || (self.precedence() == incoming.precedence()
                && incoming.associativity() == Associativity::Left)
    }
}

#[derive(Clone, Copy, Debug)]
enum Pending {
    OpenParen,
    Op(Operator),
}

/// Remove all whitespace from an expression.
pub fn condense(expression: &str) -> String {
    expression.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Convert a whitespace-free infix expression to delimited postfix.
pub fn to_postfix(infix: &str) -> FormulaResult<String> {
    let chars: Vec<char> = infix.chars().collect();
    let mut stack: Vec<Pending> = Vec::new();
    let mut postfix = String::with_capacity(infix.len() * 2);

    let mut i = 0;
    while i < chars.len() {
        let symbol = chars[i];
        if symbol == '(' {
            stack.push(Pending::OpenParen);
            i += 1;
        } else if symbol == ')' {
            loop {
                match stack.pop() {
                    Some(Pending::OpenParen) => break,
                    Some(Pending::Op(op)) => postfix.push(op.symbol()),
                    None => return Err(FormulaError::UnbalancedParentheses),
                }
            }
            i += 1;
        } else if let Some(op) = Operator::from_char(symbol) {
            while let Some(Pending::Op(top)) = stack.last().copied() {
                if !top.binds_before(op) {
                    break;
                }
                postfix.push(top.symbol());
                stack.pop();
            }
            stack.push(Pending::Op(op));
            i += 1;
        } else {
            // Constant or variable: everything up to the next operator or parenthesis.
            while i < chars.len() && !is_operator(chars[i]) && !is_parenthesis(chars[i]) {
                postfix.push(chars[i]);
                i += 1;
            }
            postfix.push(OPERAND_DELIMITER);
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Op(op) => postfix.push(op.symbol()),
            Pending::OpenParen => return Err(FormulaError::UnbalancedParentheses),
        }
    }

    Ok(postfix)
}
