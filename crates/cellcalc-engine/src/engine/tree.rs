//! Expression tree compilation and evaluation.
//!
//! A postfix string from [`to_postfix`](super::postfix::to_postfix) is folded
//! into a binary tree of [`Node`]s with a single stack pass. Evaluation takes
//! an explicit [`Bindings`] table instead of nodes holding on to shared state,
//! so a compiled tree is immutable and can be evaluated against any bindings.

use log::trace;
use std::collections::HashMap;

use super::error::{FormulaError, FormulaResult};
use super::postfix::{OPERAND_DELIMITER, Operator, condense, to_postfix};

/// Deepest tree the compiler will build. Keeps recursive evaluation bounded.
pub const MAX_TREE_DEPTH: usize = 256;

/// A node of the evaluation tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Constant(f64),
    Variable(String),
    Operator {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Evaluate recursively. Unbound variables read as `0.0`.
    pub fn evaluate(&self, bindings: &Bindings) -> f64 {
        match self {
            Node::Constant(value) => *value,
            Node::Variable(name) => bindings.get(name).unwrap_or(0.0),
            Node::Operator { op, left, right } => {
                op.apply(left.evaluate(bindings), right.evaluate(bindings))
            }
        }
    }

    /// Number of levels, counting this node.
    pub fn depth(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 1,
            Node::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Node::Constant(_) => {}
            Node::Variable(name) => names.push(name),
            Node::Operator { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }
}

/// Name to value table consulted by variable nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, f64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build a tree from a delimited postfix string.
///
/// Returns `Ok(None)` for an empty expression. Operators pop their right
/// operand first, then their left.
pub fn compile_postfix(postfix: &str) -> FormulaResult<Option<Node>> {
    let chars: Vec<char> = postfix.chars().collect();
    // Each entry carries its depth so the limit is checked without re-walking.
    let mut stack: Vec<(Node, usize)> = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        if let Some(op) = Operator::from_char(chars[i]) {
            let (right, right_depth) = stack.pop().ok_or(FormulaError::MissingOperand)?;
            let (left, left_depth) = stack.pop().ok_or(FormulaError::MissingOperand)?;
            let depth = 1 + left_depth.max(right_depth);
            if depth > MAX_TREE_DEPTH {
                return Err(FormulaError::TooDeep {
                    limit: MAX_TREE_DEPTH,
                });
            }
            stack.push((
                Node::Operator {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                depth,
            ));
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] != OPERAND_DELIMITER {
            i += 1;
        }
        let token: String = chars[start..i].iter().collect();
        // Skip the delimiter.
        i += 1;

        stack.push((operand_node(token)?, 1));
    }

    match stack.len() {
        0 => Ok(None),
        1 => Ok(stack.pop().map(|(node, _)| node)),
        _ => Err(FormulaError::DanglingOperand),
    }
}

fn operand_node(token: String) -> FormulaResult<Node> {
    match token.chars().next() {
        None => Err(FormulaError::MissingOperand),
        Some(c) if c.is_ascii_digit() || c == '.' => match token.parse::<f64>() {
            Ok(value) => Ok(Node::Constant(value)),
            Err(source) => Err(FormulaError::InvalidNumber { token, source }),
        },
        Some(_) => Ok(Node::Variable(token)),
    }
}

/// A compiled formula plus the variable values it is evaluated with.
#[derive(Clone, Debug, Default)]
pub struct ExprTree {
    root: Option<Node>,
    bindings: Bindings,
}

impl ExprTree {
    /// Compile an infix expression (whitespace allowed, no leading `=`).
    pub fn new(expression: &str) -> FormulaResult<ExprTree> {
        let postfix = to_postfix(&condense(expression))?;
        trace!("{:?} -> postfix {:?}", expression, postfix);
        let root = compile_postfix(&postfix)?;
        Ok(ExprTree {
            root,
            bindings: Bindings::new(),
        })
    }

    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.bindings.set(name, value);
    }

    /// Evaluate the tree; an empty expression is `0.0`.
    pub fn evaluate(&self) -> f64 {
        match &self.root {
            Some(root) => root.evaluate(&self.bindings),
            None => 0.0,
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Variable names in left-to-right order, duplicates included.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(root) = &self.root {
            root.collect_variables(&mut names);
        }
        names
    }
}
