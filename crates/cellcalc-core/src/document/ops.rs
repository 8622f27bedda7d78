use super::Spreadsheet;
use crate::error::Result;
use cellcalc_engine::engine::{
    CellChange, CellRef, DEFAULT_BG_COLOR, ERROR_VALUE, ExprTree, FormulaError, FormulaResult,
    check_characters, condense, detect_cycle, format_number, parse_number, resolve_variables,
};
use log::{debug, trace, warn};
use std::collections::{HashSet, VecDeque};

/// Why a formula evaluated to `ERROR`.
enum Rejection {
    Formula(FormulaError),
    Cycle(Vec<CellRef>),
}

impl Spreadsheet {
    /// Set a cell's raw text and recompute everything that depends on it.
    ///
    /// Text starting with `=` is a formula; anything else is shown verbatim.
    /// Formula problems never fail the call: they surface as the `ERROR`
    /// value. The only error is a cell outside the sheet.
    pub fn set_text(&mut self, cell: CellRef, text: &str) -> Result<()> {
        let idx = self.checked_offset(cell)?;
        if !self.cells[idx].set_text(text) {
            return Ok(());
        }
        self.modified = true;
        self.emit(cell, CellChange::Text);

        let was_error = self.cells[idx].value() == ERROR_VALUE;
        let before: Vec<CellRef> = self.graph.references(cell).collect();
        let changed = self.refresh_value(cell);
        let rewired = !self.graph.references(cell).eq(before);

        // Cycle members all show ERROR, so a rewired cell showing ERROR on
        // either side of the edit may have opened or closed a cycle.
        let is_error = self.cells[idx].value() == ERROR_VALUE;
        let membership_may_change = rewired && (was_error || is_error);
        if changed || membership_may_change {
            self.propagate_from(cell, membership_may_change);
        }
        Ok(())
    }

    /// Set a cell's background color. Never triggers recalculation.
    pub fn set_bg_color(&mut self, cell: CellRef, color: u32) -> Result<()> {
        let idx = self.checked_offset(cell)?;
        if self.cells[idx].set_bg_color(color) {
            self.modified = true;
            self.emit(cell, CellChange::BgColor);
        }
        Ok(())
    }

    /// Reset every cell to blank text and the default color, keeping the grid.
    pub fn clear(&mut self) {
        let populated: Vec<CellRef> = self.populated_cells().map(|cell| cell.position()).collect();
        for cell in populated {
            // Positions come from the grid itself, so both setters succeed.
            let _ = self.set_bg_color(cell, DEFAULT_BG_COLOR);
            let _ = self.set_text(cell, "");
        }
        self.graph.clear();
    }

    /// Evaluate a formula against the current cell values without storing it.
    ///
    /// A leading `=` is optional. Returns the display string, `ERROR` included.
    pub fn evaluate(&self, formula: &str) -> String {
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        match self.prepare(formula) {
            Ok((mut tree, variables)) => {
                self.bind_variables(&mut tree, &variables);
                format_number(tree.evaluate())
            }
            Err(err) => {
                debug!("Rejected formula {:?}: {}", formula, err);
                ERROR_VALUE.to_string()
            }
        }
    }

    /// Recompute every cell that reads `origin`, transitively.
    ///
    /// Cells are visited breadth-first from a worklist. A cell is queued at
    /// most once at a time and its readers are only queued when its value
    /// actually changes, so the walk ends once values stop moving. Cycle
    /// members always settle on `ERROR`, which bounds the walk on cyclic
    /// graphs too.
    ///
    /// With `reach_all` set, every transitive reader is recomputed at least
    /// once even when values along the way stay put. Cycle membership can
    /// change behind an unchanged `ERROR`, and only a full pass catches it.
    fn propagate_from(&mut self, origin: CellRef, reach_all: bool) {
        let mut queue: VecDeque<CellRef> = VecDeque::new();
        let mut queued: HashSet<CellRef> = HashSet::new();
        let mut visited: HashSet<CellRef> = HashSet::new();
        self.enqueue_dependents(origin, true, &visited, &mut queue, &mut queued);

        while let Some(cell) = queue.pop_front() {
            queued.remove(&cell);
            visited.insert(cell);
            trace!("Recomputing {} after a reference changed", cell);
            self.emit(cell, CellChange::Reference);
            let changed = self.refresh_value(cell);
            if changed || reach_all {
                self.enqueue_dependents(cell, changed, &visited, &mut queue, &mut queued);
            }
        }
    }

    /// Queue the readers of `cell`. Readers already recomputed in this walk
    /// are only queued again when `cell` changed value.
    fn enqueue_dependents(
        &self,
        cell: CellRef,
        changed: bool,
        visited: &HashSet<CellRef>,
        queue: &mut VecDeque<CellRef>,
        queued: &mut HashSet<CellRef>,
    ) {
        for dependent in self.graph.dependents(cell) {
            if !changed && visited.contains(&dependent) {
                continue;
            }
            if queued.insert(dependent) {
                queue.push_back(dependent);
            }
        }
    }

    /// Re-derive a cell's value from its text. Returns true if the value changed.
    fn refresh_value(&mut self, cell: CellRef) -> bool {
        let Some(idx) = self.offset(cell) else {
            return false;
        };
        let text = self.cells[idx].text().to_string();

        let value = match text.strip_prefix('=') {
            Some(formula) => match self.evaluate_formula(cell, formula) {
                Ok(number) => format_number(number),
                Err(Rejection::Formula(err)) => {
                    debug!("{}: rejected formula {:?}: {}", cell, formula, err);
                    ERROR_VALUE.to_string()
                }
                Err(Rejection::Cycle(path)) => {
                    let path: Vec<String> = path.iter().map(CellRef::to_string).collect();
                    warn!("{}: circular reference {}", cell, path.join(" -> "));
                    ERROR_VALUE.to_string()
                }
            },
            None => {
                self.graph.clear_references(cell);
                text
            }
        };

        let changed = self.cells[idx].set_value(&value);
        if changed {
            self.emit(cell, CellChange::Value);
        }
        changed
    }

    /// Compile, wire up and evaluate one formula (without the leading `=`).
    ///
    /// References are rebuilt from scratch: a formula that fails before
    /// resolution keeps none, and a formula caught in a cycle keeps its edges
    /// so that breaking the cycle later reaches it.
    fn evaluate_formula(
        &mut self,
        cell: CellRef,
        formula: &str,
    ) -> std::result::Result<f64, Rejection> {
        let (mut tree, variables) = match self.prepare(formula) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.graph.clear_references(cell);
                return Err(Rejection::Formula(err));
            }
        };

        self.graph
            .replace_references(cell, variables.iter().map(|(_, target)| *target));

        if let Some(path) = detect_cycle(cell, &self.graph) {
            return Err(Rejection::Cycle(path));
        }

        self.bind_variables(&mut tree, &variables);
        Ok(tree.evaluate())
    }

    /// Check, compile and resolve a formula (without the leading `=`).
    ///
    /// Every variable must name a cell inside the sheet or the whole formula
    /// is rejected.
    fn prepare(&self, formula: &str) -> FormulaResult<(ExprTree, Vec<(String, CellRef)>)> {
        check_characters(formula)?;
        let tree = ExprTree::new(formula)?;
        let variables = resolve_variables(&condense(formula), self.rows, self.columns)?;
        Ok((tree, variables))
    }

    /// Bind each variable to its cell's value; empty or non-numeric reads as `0`.
    fn bind_variables(&self, tree: &mut ExprTree, variables: &[(String, CellRef)]) {
        for (name, target) in variables {
            let value = self
                .cell(*target)
                .and_then(|source| parse_number(source.value()))
                .unwrap_or(0.0);
            tree.set_variable(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Spreadsheet;
    use crate::error::SheetError;
    use crate::events::CellEvent;
    use cellcalc_engine::engine::{CellChange, CellRef};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn a1(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn value(sheet: &Spreadsheet, name: &str) -> String {
        sheet.cell(a1(name)).unwrap().value().to_string()
    }

    fn record_events(sheet: &mut Spreadsheet) -> Rc<RefCell<Vec<CellEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        sheet.subscribe(move |event| sink.borrow_mut().push(*event));
        events
    }

    #[test]
    fn test_literal_text_is_shown_verbatim() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "hello").unwrap();
        assert_eq!(value(&sheet, "A1"), "hello");
        sheet.set_text(a1("A2"), "A1=").unwrap();
        assert_eq!(value(&sheet, "A2"), "A1=");
    }

    #[test]
    fn test_formula_arithmetic() {
        let mut sheet = Spreadsheet::default();
        for (text, expected) in [
            ("=2+3*4", "14"),
            ("=(2+3)*4", "20"),
            ("=2^3^2", "512"),
            ("=10-2-3", "5"),
            ("=1/4", "0.25"),
            ("=1/0", "Infinity"),
            ("=0-1/0", "-Infinity"),
            ("=0/0", "NaN"),
            ("=", "0"),
        ] {
            sheet.set_text(a1("A1"), text).unwrap();
            assert_eq!(value(&sheet, "A1"), expected, "formula {}", text);
        }
    }

    #[test]
    fn test_change_cascades_to_dependents() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("B1"), "5").unwrap();
        sheet.set_text(a1("A1"), "=B1+2").unwrap();
        assert_eq!(value(&sheet, "A1"), "7");

        sheet.set_text(a1("B1"), "7").unwrap();
        assert_eq!(value(&sheet, "A1"), "9");
    }

    #[test]
    fn test_cascade_is_transitive() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "1").unwrap();
        sheet.set_text(a1("A2"), "=A1*10").unwrap();
        sheet.set_text(a1("A3"), "=A2+A1").unwrap();
        assert_eq!(value(&sheet, "A3"), "11");

        sheet.set_text(a1("A1"), "2").unwrap();
        assert_eq!(value(&sheet, "A2"), "20");
        assert_eq!(value(&sheet, "A3"), "22");
    }

    #[test]
    fn test_formula_before_its_inputs() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("C1"), "=A1+B1").unwrap();
        assert_eq!(value(&sheet, "C1"), "0");
        sheet.set_text(a1("A1"), "3").unwrap();
        sheet.set_text(a1("B1"), "4").unwrap();
        assert_eq!(value(&sheet, "C1"), "7");
    }

    #[test]
    fn test_non_numeric_reference_reads_as_zero() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "abc").unwrap();
        sheet.set_text(a1("B1"), "=A1+1").unwrap();
        assert_eq!(value(&sheet, "B1"), "1");
    }

    #[test]
    fn test_invalid_formulas_show_error() {
        let mut sheet = Spreadsheet::default();
        for text in ["=A1&B2", "=AA1", "=A0", "=A51", "=(1+2", "=1+", "=1.2.3", "=B"] {
            sheet.set_text(a1("C1"), text).unwrap();
            assert_eq!(value(&sheet, "C1"), "ERROR", "formula {}", text);
            assert!(sheet.references(a1("C1")).is_empty(), "formula {}", text);
        }
    }

    #[test]
    fn test_unresolvable_reference_keeps_no_partial_edges() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("C1"), "=A1+AA1").unwrap();
        assert_eq!(value(&sheet, "C1"), "ERROR");
        assert!(sheet.dependents(a1("A1")).is_empty());
    }

    #[test]
    fn test_references_rebuilt_on_text_change() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("C1"), "=A1+B1").unwrap();
        assert_eq!(sheet.references(a1("C1")), vec![a1("A1"), a1("B1")]);

        sheet.set_text(a1("C1"), "=B2").unwrap();
        assert_eq!(sheet.references(a1("C1")), vec![a1("B2")]);
        assert!(sheet.dependents(a1("A1")).is_empty());

        // A1 no longer feeds C1.
        sheet.set_text(a1("A1"), "100").unwrap();
        assert_eq!(value(&sheet, "C1"), "0");

        sheet.set_text(a1("C1"), "plain").unwrap();
        assert!(sheet.references(a1("C1")).is_empty());
    }

    #[test]
    fn test_cycle_marks_members_and_terminates() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1").unwrap();
        sheet.set_text(a1("B1"), "=A1").unwrap();
        assert_eq!(value(&sheet, "A1"), "ERROR");
        assert_eq!(value(&sheet, "B1"), "ERROR");
        assert!(sheet.is_in_cycle(a1("A1")));
    }

    #[test]
    fn test_self_reference_is_error() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=A1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), "ERROR");
    }

    #[test]
    fn test_breaking_cycle_recovers() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1+1").unwrap();
        sheet.set_text(a1("B1"), "=C1").unwrap();
        sheet.set_text(a1("C1"), "=A1").unwrap();
        sheet.set_text(a1("D1"), "=A1*2").unwrap();
        for name in ["A1", "B1", "C1"] {
            assert_eq!(value(&sheet, name), "ERROR");
        }
        // Reads into the cycle but is not a member.
        assert!(!sheet.is_in_cycle(a1("D1")));
        assert_eq!(value(&sheet, "D1"), "0");

        sheet.set_text(a1("C1"), "4").unwrap();
        assert_eq!(value(&sheet, "B1"), "4");
        assert_eq!(value(&sheet, "A1"), "5");
        assert_eq!(value(&sheet, "D1"), "10");
    }

    #[test]
    fn test_longer_cycle_only_marks_members() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1").unwrap();
        sheet.set_text(a1("B1"), "=C1+D2").unwrap();
        sheet.set_text(a1("D2"), "=A4").unwrap();
        sheet.set_text(a1("C1"), "3").unwrap();
        sheet.set_text(a1("A4"), "=A1").unwrap();

        for name in ["A1", "B1", "D2", "A4"] {
            assert!(sheet.is_in_cycle(a1(name)), "{} should be cyclic", name);
            assert_eq!(value(&sheet, name), "ERROR");
        }
        assert!(!sheet.is_in_cycle(a1("C1")));
        assert_eq!(value(&sheet, "C1"), "3");
    }

    #[test]
    fn test_event_order_for_cascade() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1*2").unwrap();
        let events = record_events(&mut sheet);

        sheet.set_text(a1("B1"), "3").unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                CellEvent::new(a1("B1"), CellChange::Text),
                CellEvent::new(a1("B1"), CellChange::Value),
                CellEvent::new(a1("A1"), CellChange::Reference),
                CellEvent::new(a1("A1"), CellChange::Value),
            ]
        );
    }

    #[test]
    fn test_same_text_is_a_no_op() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=1+1").unwrap();
        sheet.set_bg_color(a1("A1"), 0xFF00_00FF).unwrap();
        let events = record_events(&mut sheet);

        sheet.set_text(a1("A1"), "=1+1").unwrap();
        sheet.set_bg_color(a1("A1"), 0xFF00_00FF).unwrap();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_unchanged_value_does_not_cascade() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "5").unwrap();
        sheet.set_text(a1("B1"), "=A1").unwrap();
        let events = record_events(&mut sheet);

        sheet.set_text(a1("A1"), "=5").unwrap();
        assert_eq!(
            *events.borrow(),
            vec![CellEvent::new(a1("A1"), CellChange::Text)]
        );
    }

    #[test]
    fn test_rewiring_to_equal_value_does_not_cascade() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("C1"), "5").unwrap();
        sheet.set_text(a1("A1"), "=5").unwrap();
        sheet.set_text(a1("B1"), "=A1").unwrap();
        let events = record_events(&mut sheet);

        // New edges, same value, no ERROR on either side.
        sheet.set_text(a1("A1"), "=C1").unwrap();
        assert_eq!(
            *events.borrow(),
            vec![CellEvent::new(a1("A1"), CellChange::Text)]
        );
        assert_eq!(sheet.references(a1("A1")), vec![a1("C1")]);
    }

    #[test]
    fn test_breaking_cycle_with_invalid_formula_frees_other_member() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1").unwrap();
        sheet.set_text(a1("B1"), "=A1").unwrap();
        assert_eq!(value(&sheet, "B1"), "ERROR");

        // A1 stays ERROR but no longer reads B1.
        sheet.set_text(a1("A1"), "=B1&").unwrap();
        assert_eq!(value(&sheet, "A1"), "ERROR");
        assert!(!sheet.is_in_cycle(a1("B1")));
        assert_eq!(value(&sheet, "B1"), "0");
    }

    #[test]
    fn test_closing_cycle_from_error_cell_marks_members() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("C1"), "=(").unwrap();
        sheet.set_text(a1("B1"), "=C1").unwrap();
        assert_eq!(value(&sheet, "B1"), "0");

        // C1 was ERROR already and stays ERROR as it closes the loop.
        sheet.set_text(a1("C1"), "=B1").unwrap();
        assert!(sheet.is_in_cycle(a1("B1")));
        assert_eq!(value(&sheet, "C1"), "ERROR");
        assert_eq!(value(&sheet, "B1"), "ERROR");
    }

    #[test]
    fn test_closing_cycle_reaches_members_behind_unchanged_error() {
        let mut sheet = Spreadsheet::default();
        // D1 sits in its own loop with E1, so it is ERROR before and after.
        sheet.set_text(a1("D1"), "=E1+A1").unwrap();
        sheet.set_text(a1("E1"), "=D1").unwrap();
        sheet.set_text(a1("B1"), "=D1").unwrap();
        sheet.set_text(a1("A1"), "=(").unwrap();
        assert_eq!(value(&sheet, "D1"), "ERROR");
        assert_eq!(value(&sheet, "B1"), "0");

        // A1 -> B1 -> D1 -> A1 closes through D1.
        sheet.set_text(a1("A1"), "=B1").unwrap();
        for name in ["A1", "B1", "D1", "E1"] {
            assert!(sheet.is_in_cycle(a1(name)), "{} should be cyclic", name);
            assert_eq!(value(&sheet, name), "ERROR");
        }
    }

    #[test]
    fn test_color_change_does_not_recalculate() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "=B1").unwrap();
        let events = record_events(&mut sheet);

        sheet.set_bg_color(a1("B1"), 0xFF11_2233).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![CellEvent::new(a1("B1"), CellChange::BgColor)]
        );
        assert_eq!(sheet.cell(a1("B1")).unwrap().bg_color(), 0xFF11_2233);
    }

    #[test]
    fn test_out_of_bounds_cell_is_an_error() {
        let mut sheet = Spreadsheet::with_size(5, 5).unwrap();
        assert!(matches!(
            sheet.set_text(a1("F1"), "1"),
            Err(SheetError::OutOfBounds(_))
        ));
        assert!(matches!(
            sheet.set_bg_color(a1("A6"), 0),
            Err(SheetError::OutOfBounds(_))
        ));
        // References are checked against the sheet size too.
        sheet.set_text(a1("A1"), "=F1").unwrap();
        assert_eq!(value(&sheet, "A1"), "ERROR");
    }

    #[test]
    fn test_clear_resets_cells_and_edges() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "2").unwrap();
        sheet.set_text(a1("B1"), "=A1*A1").unwrap();
        sheet.set_bg_color(a1("C3"), 0xFF00_0000).unwrap();

        sheet.clear();
        assert_eq!(sheet.populated_cells().count(), 0);
        assert!(sheet.dependents(a1("A1")).is_empty());
        assert_eq!(value(&sheet, "B1"), "");
    }

    #[test]
    fn test_evaluate_reads_cells_without_storing() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text(a1("A1"), "6").unwrap();
        let events = record_events(&mut sheet);

        assert_eq!(sheet.evaluate("A1 * 7"), "42");
        assert_eq!(sheet.evaluate("=A1/4"), "1.5");
        assert_eq!(sheet.evaluate("A1 & 2"), "ERROR");
        assert!(events.borrow().is_empty());
        assert!(sheet.dependents(a1("A1")).is_empty());
    }

    #[test]
    fn test_edits_mark_modified() {
        let mut sheet = Spreadsheet::default();
        assert!(!sheet.modified);
        sheet.set_text(a1("A1"), "x").unwrap();
        assert!(sheet.modified);
    }
}
