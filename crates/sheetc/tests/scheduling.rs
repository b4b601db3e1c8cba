//! Dependency ordering and cycle handling through the full pipeline

use sheetc::prelude::*;

fn snapshot(cells: &[(&str, &str)]) -> WorkbookSnapshot {
    let mut snapshot = WorkbookSnapshot::new();
    let sheet = snapshot.add_sheet("S").unwrap();
    for &(addr, content) in cells {
        sheet.insert(CellRecord::new(CellCoord::parse(addr).unwrap(), content));
    }
    snapshot
}

/// Position of the plan item producing the given cell
fn item_position(output: &CompileOutput, cell: &str) -> usize {
    output
        .plan
        .items
        .iter()
        .position(|item| item.produced().iter().any(|a| a.to_string() == cell))
        .unwrap_or_else(|| panic!("{} not found in plan", cell))
}

#[test]
fn test_chain_scheduled_in_order() {
    // A1 ← B1 ← C1 (declared backwards)
    let output = compile(&snapshot(&[
        ("A1", "=B1+1"),
        ("B1", "=C1*2"),
        ("C1", "=41+1"),
    ]))
    .unwrap();

    assert!(item_position(&output, "S!C1") < item_position(&output, "S!B1"));
    assert!(item_position(&output, "S!B1") < item_position(&output, "S!A1"));
}

#[test]
fn test_sum_over_formula_range_comes_last() {
    // C2..C6 are formulas, C7 sums them
    let mut cells: Vec<(String, String)> = (2..=6)
        .map(|r| (format!("C{}", r), format!("=A{}*B{}", r, r)))
        .collect();
    cells.push(("C7".to_string(), "=SUM(C2:C6)".to_string()));
    let borrowed: Vec<(&str, &str)> = cells
        .iter()
        .map(|(a, f)| (a.as_str(), f.as_str()))
        .collect();

    let output = compile(&snapshot(&borrowed)).unwrap();
    let sum_pos = item_position(&output, "S!C7");
    for r in 2..=6 {
        assert!(item_position(&output, &format!("S!C{}", r)) <= sum_pos);
        assert_ne!(item_position(&output, &format!("S!C{}", r)), sum_pos);
    }
}

#[test]
fn test_two_cycle_degrades_with_diagnostic() {
    let output = compile(&snapshot(&[("A1", "=B1"), ("B1", "=A1")])).unwrap();

    // Both cells exactly once in the plan
    let mut produced: Vec<String> = output
        .plan
        .items
        .iter()
        .flat_map(|i| i.produced().into_iter().map(|a| a.to_string()))
        .collect();
    produced.sort();
    assert_eq!(produced, vec!["S!A1", "S!B1"]);

    let cycles: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CycleDetected)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("S!A1"));
    assert!(cycles[0].message.contains("S!B1"));
    assert_eq!(output.stats.cycle_cells, 2);

    // Emission stays well-formed: both cells still get guarded assignments
    assert!(output.script.contains("c[('S', 'A', 1)]"));
    assert!(output.script.contains("c[('S', 'B', 1)]"));
}

#[test]
fn test_three_cycle_deterministic_order() {
    let cells = [("A1", "=C1"), ("B1", "=A1"), ("C1", "=B1")];
    let first = compile(&snapshot(&cells)).unwrap();
    let second = compile(&snapshot(&cells)).unwrap();

    let order = |o: &CompileOutput| -> Vec<String> {
        o.plan
            .items
            .iter()
            .flat_map(|i| i.produced().into_iter().map(|a| a.to_string()))
            .collect()
    };
    assert_eq!(order(&first), order(&second));
    assert_eq!(first.script, second.script);
    assert_eq!(first.stats.cycle_cells, 3);

    let mut produced = order(&first);
    produced.sort();
    assert_eq!(produced, vec!["S!A1", "S!B1", "S!C1"]);
}

#[test]
fn test_cycle_plus_healthy_cells() {
    // The cycle must not poison the independent chain
    let output = compile(&snapshot(&[
        ("A1", "=B1"),
        ("B1", "=A1"),
        ("D1", "=7*6"),
        ("E1", "=D1+1"),
    ]))
    .unwrap();

    assert!(item_position(&output, "S!D1") < item_position(&output, "S!E1"));
    assert_eq!(output.stats.cycle_cells, 2);
    // Healthy cells scheduled ahead of the cyclic leftovers
    assert!(item_position(&output, "S!E1") < item_position(&output, "S!A1"));
}

#[test]
fn test_self_reference_is_a_cycle() {
    let output = compile(&snapshot(&[("A1", "=A1+1")])).unwrap();
    // A cell reading itself is scheduled once; the self-edge is dropped
    // during graph construction, so no diagnostic fires for it
    assert_eq!(output.plan.cell_count(), 1);
}

#[test]
fn test_cross_sheet_dependencies_ordered() {
    let mut snapshot = WorkbookSnapshot::new();
    {
        let sheet = snapshot.add_sheet("Inputs").unwrap();
        sheet.insert(CellRecord::new(CellCoord::parse("A1").unwrap(), "5"));
        sheet.insert(CellRecord::new(CellCoord::parse("B1").unwrap(), "=A1*2"));
    }
    {
        let sheet = snapshot.add_sheet("Calc").unwrap();
        sheet.insert(CellRecord::new(
            CellCoord::parse("A1").unwrap(),
            "=Inputs!B1+1",
        ));
    }

    let output = compile(&snapshot).unwrap();
    assert!(item_position(&output, "Inputs!B1") < item_position(&output, "Calc!A1"));
}
