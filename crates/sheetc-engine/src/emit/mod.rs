//! Code emitter
//!
//! Renders an [`EvaluationPlan`] as a Python script: the embedded runtime
//! prelude, then one compute block per plan item in plan order. Singles
//! become guarded scalar assignments; groups become one loop each, whose
//! induction variable substitutes for every relative axis captured by the
//! group's pattern. The loop body expression is derived once from the
//! representative formula and reused for every member.
//!
//! Per-cell translation failure is an explicit result ([`Emitted`]), not
//! control flow: the failing cell gets a fallback assignment that keeps
//! its last cached value (or the `None` sentinel) and the batch continues.

pub mod runtime;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::group::{Direction, FormulaGroup, SingleCell};
use crate::plan::{EvaluationPlan, PlanItem};
use crate::tables::TableIndex;
use crate::translate::{py_str, translate, RefStyle, TranslateContext, TranslateIssue};
use runtime::RUNTIME_HELPERS;
use sheetc_core::CellAddress;

/// Outcome of translating one plan item's expression
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    /// A usable expression
    Ok(String),
    /// Translation failed; emit the sentinel assignment instead
    Fallback { sentinel: String, reason: String },
}

/// Result of emission
#[derive(Debug, Clone)]
pub struct EmitResult {
    pub script: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate a single cell's formula into an emission outcome
pub fn emit_cell(single: &SingleCell, tables: &TableIndex) -> (Emitted, Vec<TranslateIssue>) {
    let ctx = TranslateContext::new(&single.cell.sheet, tables).with_host(single.cell.coord());
    match translate(&single.formula, &ctx) {
        Ok(t) => (Emitted::Ok(t.expr), t.issues),
        Err(e) => (
            Emitted::Fallback {
                sentinel: store_key(&single.cell),
                reason: e.to_string(),
            },
            Vec::new(),
        ),
    }
}

/// Render the whole plan as a Python script
pub fn emit_script(plan: &EvaluationPlan, tables: &TableIndex) -> EmitResult {
    let mut emitter = Emitter {
        tables,
        lines: Vec::new(),
        diagnostics: Vec::new(),
    };

    emitter.lines.push("\"\"\"Auto-generated calculation script.".to_string());
    emitter.lines.push(String::new());
    emitter
        .lines
        .push("Cell values live in a dict keyed by (sheet, column_letters, row);".to_string());
    emitter
        .lines
        .push("populate the inputs, call compute(c), read the results back.".to_string());
    emitter.lines.push("\"\"\"".to_string());
    emitter.lines.push(String::new());
    emitter.lines.push(RUNTIME_HELPERS.trim_end().to_string());
    emitter.lines.push(String::new());
    emitter.lines.push(String::new());
    emitter.lines.push("def compute(c):".to_string());
    emitter
        .lines
        .push("    \"\"\"Evaluate every formula cell, dependencies first.\"\"\"".to_string());

    if plan.items.is_empty() {
        emitter.lines.push("    pass".to_string());
    }
    for item in &plan.items {
        match item {
            PlanItem::Single(single) => emitter.emit_single(single),
            PlanItem::Group(group) => emitter.emit_group(group),
        }
    }

    emitter.lines.push("    return c".to_string());
    emitter.lines.push(String::new());

    EmitResult {
        script: emitter.lines.join("\n"),
        diagnostics: emitter.diagnostics,
    }
}

/// Python tuple key for a cell
fn store_key(cell: &CellAddress) -> String {
    format!(
        "({}, {}, {})",
        py_str(&cell.sheet),
        py_str(&cell.col_letters()),
        cell.row
    )
}

/// Compact bounds for consecutive indices, explicit list otherwise
fn index_list(indices: &[u32]) -> String {
    let consecutive = indices
        .windows(2)
        .all(|w| w[1] == w[0] + 1);
    if indices.len() >= 2 && consecutive {
        format!("range({}, {})", indices[0], indices[indices.len() - 1] + 1)
    } else {
        let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
        format!("[{}]", parts.join(", "))
    }
}

struct Emitter<'a> {
    tables: &'a TableIndex,
    lines: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    fn report_issues(&mut self, cell: &CellAddress, issues: &[TranslateIssue]) {
        for issue in issues {
            let diagnostic = match issue {
                TranslateIssue::UnknownFunction(name) => Diagnostic::for_cell(
                    cell.clone(),
                    DiagnosticKind::UnknownFunction,
                    format!("function {} is not in the mapping table; emitted xl_{}", name, name.to_lowercase()),
                ),
                TranslateIssue::Unrecognized(fragment) => Diagnostic::for_cell(
                    cell.clone(),
                    DiagnosticKind::ParseError,
                    format!("fragment '{}' left untranslated", fragment),
                ),
            };
            self.diagnostics.push(diagnostic);
        }
    }

    fn emit_single(&mut self, single: &SingleCell) {
        let key = store_key(&single.cell);
        let (emitted, issues) = emit_cell(single, self.tables);
        self.report_issues(&single.cell, &issues);

        match emitted {
            Emitted::Ok(expr) => {
                self.lines.push("    try:".to_string());
                self.lines.push(format!("        c[{}] = {}", key, expr));
                self.lines.push("    except Exception:".to_string());
                self.lines
                    .push(format!("        c[{}] = c.get({})", key, key));
            }
            Emitted::Fallback { sentinel, reason } => {
                log::warn!("translation failed for {}: {}", single.cell, reason);
                self.diagnostics.push(Diagnostic::for_cell(
                    single.cell.clone(),
                    DiagnosticKind::TranslationFailure,
                    format!("{}; emitted fallback assignment", reason),
                ));
                self.lines
                    .push(format!("    # could not translate {}: {}", single.cell, reason));
                self.lines
                    .push(format!("    c[{}] = c.get({})", sentinel, sentinel));
            }
        }
    }

    fn emit_group(&mut self, group: &FormulaGroup) {
        let anchor = group.anchor();
        let last = group.cells.last().expect("groups are never empty");
        let span = format!(
            "{}!{}{}:{}{}",
            anchor.sheet,
            anchor.col_letters(),
            anchor.row,
            last.col_letters(),
            last.row
        );

        let style = match group.direction {
            Direction::Vertical => RefStyle::VerticalLoop {
                base_row: anchor.row,
            },
            Direction::Horizontal => RefStyle::HorizontalLoop {
                base_col: anchor.col,
            },
        };
        let ctx = TranslateContext::new(&anchor.sheet, self.tables)
            .with_host(anchor.coord())
            .with_style(style);

        let translation = match translate(&group.representative, &ctx) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("translation failed for group {}: {}", span, e);
                self.diagnostics.push(Diagnostic::for_cell(
                    anchor.clone(),
                    DiagnosticKind::TranslationFailure,
                    format!("{}; emitted fallback assignments for {} cells", e, group.len()),
                ));
                self.lines
                    .push(format!("    # could not translate group {}: {}", span, e));
                for cell in &group.cells {
                    let key = store_key(cell);
                    self.lines.push(format!("    c[{}] = c.get({})", key, key));
                }
                return;
            }
        };
        self.report_issues(anchor, &translation.issues);

        let sheet_lit = py_str(&anchor.sheet);
        self.lines
            .push(format!("    # Vectorized: {} ({} cells)", span, group.len()));
        match group.direction {
            Direction::Vertical => {
                let rows: Vec<u32> = group.cells.iter().map(|c| c.row).collect();
                let col_lit = py_str(&anchor.col_letters());
                let key = format!("({}, {}, _r)", sheet_lit, col_lit);
                self.lines
                    .push(format!("    for _r in {}:", index_list(&rows)));
                self.lines.push("        try:".to_string());
                self.lines
                    .push(format!("            c[{}] = {}", key, translation.expr));
                self.lines.push("        except Exception:".to_string());
                self.lines
                    .push(format!("            c[{}] = c.get({})", key, key));
            }
            Direction::Horizontal => {
                let cols: Vec<u32> = group.cells.iter().map(|c| c.col).collect();
                let key = format!("({}, _cl(_ci), {})", sheet_lit, anchor.row);
                self.lines
                    .push(format!("    for _ci in {}:", index_list(&cols)));
                self.lines.push("        try:".to_string());
                self.lines
                    .push(format!("            c[{}] = {}", key, translation.expr));
                self.lines.push("        except Exception:".to_string());
                self.lines
                    .push(format!("            c[{}] = c.get({})", key, key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::group::group_formulas;
    use crate::plan::order_items;
    use crate::resolve::extract_references;
    use pretty_assertions::assert_eq;
    use sheetc_core::column_to_letters;

    fn cell(col: u32, row: u32, formula: &str) -> (CellAddress, String) {
        (CellAddress::new("S", col, row), formula.to_string())
    }

    fn plan_and_emit(cells: Vec<(CellAddress, String)>) -> EmitResult {
        let tables = TableIndex::new();
        let resolved: Vec<_> = cells
            .iter()
            .map(|(a, f)| (a.clone(), extract_references(f, &a.sheet)))
            .collect();
        let graph = DependencyGraph::build(&resolved, &tables);
        let (groups, singles) = group_formulas(&cells);
        let plan = order_items(groups, singles, &graph);
        emit_script(&plan, &tables)
    }

    #[test]
    fn test_single_assignment_guarded() {
        let result = plan_and_emit(vec![cell(3, 1, "=A1+B1")]);
        assert!(result.script.contains("    try:"));
        assert!(result
            .script
            .contains("        c[('S', 'C', 1)] = c.get(('S', 'A', 1)) + c.get(('S', 'B', 1))"));
        assert!(result.script.contains("    except Exception:"));
        assert!(result
            .script
            .contains("        c[('S', 'C', 1)] = c.get(('S', 'C', 1))"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_vertical_group_single_loop() {
        let cells: Vec<_> = (2..=6)
            .map(|r| cell(4, r, &format!("=A{}-B{}", r, r)))
            .collect();
        let result = plan_and_emit(cells);
        assert!(result.script.contains("# Vectorized: S!D2:D6 (5 cells)"));
        assert!(result.script.contains("    for _r in range(2, 7):"));
        assert!(result
            .script
            .contains("c[('S', 'D', _r)] = c.get(('S', 'A', _r)) - c.get(('S', 'B', _r))"));
        // Exactly one loop for five cells
        assert_eq!(result.script.matches("for _r in").count(), 1);
    }

    #[test]
    fn test_horizontal_group_loop() {
        let cells: Vec<_> = (2..=4)
            .map(|c| {
                let letters = column_to_letters(c);
                cell(c, 3, &format!("={}2*2", letters))
            })
            .collect();
        let result = plan_and_emit(cells);
        assert!(result.script.contains("    for _ci in range(2, 5):"));
        assert!(result
            .script
            .contains("c[('S', _cl(_ci), 3)] = c.get(('S', _cl(_ci), 2)) * 2"));
    }

    #[test]
    fn test_unknown_function_diagnostic() {
        let result = plan_and_emit(vec![cell(1, 1, "=MYSTERY(B1)")]);
        assert!(result.script.contains("xl_mystery(c.get(('S', 'B', 1)))"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnknownFunction);
    }

    #[test]
    fn test_translation_failure_fallback() {
        let result = plan_and_emit(vec![cell(1, 1, "=\"broken")]);
        assert!(result
            .script
            .contains("c[('S', 'A', 1)] = c.get(('S', 'A', 1))"));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::TranslationFailure));
    }

    #[test]
    fn test_emit_cell_result_type() {
        let tables = TableIndex::new();
        let good = SingleCell {
            cell: CellAddress::new("S", 1, 1),
            formula: "=1+1".into(),
        };
        let (emitted, _) = emit_cell(&good, &tables);
        assert_eq!(emitted, Emitted::Ok("1 + 1".into()));

        let bad = SingleCell {
            cell: CellAddress::new("S", 1, 2),
            formula: "=\"oops".into(),
        };
        let (emitted, _) = emit_cell(&bad, &tables);
        assert!(matches!(emitted, Emitted::Fallback { .. }));
    }

    #[test]
    fn test_index_list() {
        assert_eq!(index_list(&[2, 3, 4, 5, 6]), "range(2, 7)");
        assert_eq!(index_list(&[2, 4, 7]), "[2, 4, 7]");
        assert_eq!(index_list(&[3]), "[3]");
    }

    #[test]
    fn test_prelude_present_once() {
        let result = plan_and_emit(vec![cell(1, 1, "=SUM(B1:B3)")]);
        assert_eq!(result.script.matches("def xl_sum(").count(), 1);
        assert_eq!(result.script.matches("def compute(c):").count(), 1);
        assert!(result.script.trim_end().ends_with("return c"));
    }
}
