//! Circular reference detection.
//!
//! A cell is in a cycle when it can reach itself through one or more
//! reference edges (A reads B, B reads C, C reads A). Cells that merely
//! read *into* a cycle are not members. The walk is a depth-first search that
//! visits each cell at most once, so it terminates on any graph shape. It
//! keeps its own stack, so chain length is bounded by memory rather than by
//! the thread's call stack.

use std::collections::HashMap;

use super::{CellRef, DepGraph};

/// Detect whether `start` belongs to a reference cycle.
/// Returns Some(path) from `start` back to `start` if it does, None otherwise.
pub fn detect_cycle(start: CellRef, graph: &DepGraph) -> Option<Vec<CellRef>> {
    // Each reached cell maps to the cell it was first reached from.
    let mut parent: HashMap<CellRef, CellRef> = HashMap::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        for next in graph.references(current) {
            if next == start {
                return Some(path_back_to(start, current, &parent));
            }
            if !parent.contains_key(&next) {
                parent.insert(next, current);
                stack.push(next);
            }
        }
    }

    None
}

/// True if `start` belongs to a reference cycle.
pub fn is_in_cycle(start: CellRef, graph: &DepGraph) -> bool {
    detect_cycle(start, graph).is_some()
}

/// Rebuild `start -> ... -> last -> start` from the parent links.
fn path_back_to(
    start: CellRef,
    last: CellRef,
    parent: &HashMap<CellRef, CellRef>,
) -> Vec<CellRef> {
    let mut path = Vec::new();
    let mut cell = last;
    while cell != start {
        path.push(cell);
        match parent.get(&cell) {
            Some(&prev) => cell = prev,
            None => break,
        }
    }
    path.push(start);
    path.reverse();
    path.push(start);
    path
}
