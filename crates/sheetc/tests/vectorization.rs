//! Drag detection and vectorized emission through the full pipeline

use sheetc::prelude::*;

fn snapshot(cells: &[(&str, String)]) -> WorkbookSnapshot {
    let mut snapshot = WorkbookSnapshot::new();
    let sheet = snapshot.add_sheet("S").unwrap();
    for (addr, content) in cells {
        sheet.insert(CellRecord::new(CellCoord::parse(addr).unwrap(), content.clone()));
    }
    snapshot
}

fn dragged_column(col: &str, rows: std::ops::RangeInclusive<u32>, template: &str) -> Vec<(String, String)> {
    rows.map(|r| {
        (
            format!("{}{}", col, r),
            template.replace("{r}", &r.to_string()),
        )
    })
    .collect()
}

#[test]
fn test_row_dragged_run_builds_one_group() {
    let cells = dragged_column("D", 2..=6, "=A{r}-B{r}");
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    assert_eq!(output.stats.groups, 1);
    assert_eq!(output.stats.grouped_cells, 5);
    assert_eq!(output.stats.singles, 0);

    let descriptor = &output.groups[0];
    assert_eq!(descriptor.sheet, "S");
    assert_eq!(descriptor.anchor_range, "D2:D6");
    assert_eq!(descriptor.direction, Direction::Vertical);
    assert_eq!(descriptor.member_count, 5);
    assert_eq!(descriptor.representative_formula, "=A2-B2");

    // One loop, one body expression, reused for all five members
    assert_eq!(output.script.matches("for _r in").count(), 1);
    assert!(output
        .script
        .contains("c[('S', 'D', _r)] = c.get(('S', 'A', _r)) - c.get(('S', 'B', _r))"));
}

#[test]
fn test_absolute_anchor_stays_literal_in_loop() {
    let cells = dragged_column("B", 2..=5, "=A{r}*$D$1");
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    assert_eq!(output.stats.groups, 1);
    assert!(output
        .script
        .contains("c[('S', 'B', _r)] = c.get(('S', 'A', _r)) * c.get(('S', 'D', 1))"));
}

#[test]
fn test_horizontal_run_emits_column_loop() {
    let cells: Vec<(String, String)> = (2..=5)
        .map(|c| {
            let letters = sheetc::column_to_letters(c);
            (format!("{}7", letters), format!("={}6*1.1", letters))
        })
        .collect();
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    assert_eq!(output.stats.groups, 1);
    assert_eq!(output.groups[0].direction, Direction::Horizontal);
    assert_eq!(output.groups[0].anchor_range, "B7:E7");
    assert!(output.script.contains("for _ci in range(2, 6):"));
    assert!(output
        .script
        .contains("c[('S', _cl(_ci), 7)] = c.get(('S', _cl(_ci), 6)) * 1.1"));
}

#[test]
fn test_near_copies_do_not_group() {
    // Same skeleton, but the second row breaks the offset pattern
    let cells = vec![
        ("D2".to_string(), "=A2*2".to_string()),
        ("D3".to_string(), "=A5*2".to_string()),
        ("D4".to_string(), "=A4*2".to_string()),
    ];
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    // D2 and D4 share a pattern but are not contiguous; D3 differs
    assert_eq!(output.stats.groups, 0);
    assert_eq!(output.stats.singles, 3);
}

#[test]
fn test_every_cell_lands_exactly_once() {
    let mut cells = dragged_column("D", 2..=9, "=A{r}+B{r}");
    cells.extend(dragged_column("E", 2..=4, "=SUM($A$1:A{r})"));
    cells.push(("G1".to_string(), "=NOW()".to_string()));
    cells.push(("G2".to_string(), "=D2*E2".to_string()));
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    let mut produced: Vec<String> = output
        .plan
        .items
        .iter()
        .flat_map(|i| i.produced().into_iter().map(|a| a.to_string()))
        .collect();
    let total = produced.len();
    produced.sort();
    produced.dedup();
    assert_eq!(total, produced.len(), "a cell appeared in two plan items");
    assert_eq!(total, cells.len());
}

#[test]
fn test_group_descriptors_match_plan_order() {
    let mut cells = dragged_column("B", 2..=4, "=A{r}*2");
    // C2..C4 depend on the B group, so their group must come later
    cells.extend(dragged_column("C", 2..=4, "=B{r}+1"));
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    assert_eq!(output.stats.groups, 2);
    assert_eq!(output.groups[0].anchor_range, "B2:B4");
    assert_eq!(output.groups[1].anchor_range, "C2:C4");

    // The emitted loops appear in the same order
    let b_loop = output.script.find("c[('S', 'B', _r)]").unwrap();
    let c_loop = output.script.find("c[('S', 'C', _r)]").unwrap();
    assert!(b_loop < c_loop);
}

#[test]
fn test_growing_sum_vectorizes_with_anchored_start() {
    // A classic running total: =SUM($A$1:A2) dragged down
    let cells = dragged_column("B", 2..=6, "=SUM($A$1:A{r})");
    let borrowed: Vec<(&str, String)> =
        cells.iter().map(|(a, f)| (a.as_str(), f.clone())).collect();
    let output = compile(&snapshot(&borrowed)).unwrap();

    assert_eq!(output.stats.groups, 1);
    assert!(output
        .script
        .contains("c[('S', 'B', _r)] = xl_sum(_rng(c, 'S', 'A', 1, 'A', _r))"));
}
