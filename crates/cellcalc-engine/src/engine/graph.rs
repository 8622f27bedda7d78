//! Directed dependency graph between cells.
//!
//! An edge `A -> B` means "A's formula reads B". Both directions are kept:
//! `references` answers "what does A read" (cycle detection), `dependents`
//! answers "who reads B" (recalculation). Edges are derived state: a cell's
//! outgoing edges are cleared and rebuilt wholesale whenever its text changes.

use std::collections::{BTreeSet, HashMap};

use super::cell_ref::CellRef;

#[derive(Clone, Debug, Default)]
pub struct DepGraph {
    references: HashMap<CellRef, BTreeSet<CellRef>>,
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` reads `to`. Returns false if the edge already existed.
    pub fn add_reference(&mut self, from: CellRef, to: CellRef) -> bool {
        let added = self.references.entry(from).or_default().insert(to);
        if added {
            self.dependents.entry(to).or_default().insert(from);
        }
        added
    }

    /// Drop every outgoing edge of `cell`, returning the cells it used to read.
    pub fn clear_references(&mut self, cell: CellRef) -> BTreeSet<CellRef> {
        let old = self.references.remove(&cell).unwrap_or_default();
        for target in &old {
            if let Some(readers) = self.dependents.get_mut(target) {
                readers.remove(&cell);
                if readers.is_empty() {
                    self.dependents.remove(target);
                }
            }
        }
        old
    }

    /// Replace the outgoing edges of `cell` with `targets`.
    pub fn replace_references<I>(&mut self, cell: CellRef, targets: I)
    where
        I: IntoIterator<Item = CellRef>,
    {
        self.clear_references(cell);
        for target in targets {
            self.add_reference(cell, target);
        }
    }

    /// Cells that `cell` reads, in row-major order.
    pub fn references(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.references.get(&cell).into_iter().flatten().copied()
    }

    /// Cells that read `cell`, in row-major order.
    pub fn dependents(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.dependents.get(&cell).into_iter().flatten().copied()
    }

    pub fn has_references(&self, cell: CellRef) -> bool {
        self.references.contains_key(&cell)
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.references.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn clear(&mut self) {
        self.references.clear();
        self.dependents.clear();
    }
}
