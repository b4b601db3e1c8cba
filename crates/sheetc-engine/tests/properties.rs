//! Property tests for pattern equivalence, grouping and scheduling

use proptest::prelude::*;
use sheetc_core::{column_to_letters, CellAddress};
use sheetc_engine::{
    compute_pattern, extract_references, group_formulas, DependencyGraph, TableIndex,
};

proptest! {
    /// Exact row-drag copies always share a pattern key
    #[test]
    fn pattern_key_invariant_under_row_drag(
        col in 2u32..20,
        row in 2u32..100,
        shift in 1u32..50,
    ) {
        let left = column_to_letters(col - 1);
        let right = column_to_letters(col + 1);
        let original = format!("={}{}+{}{}", left, row, right, row + 1);
        let dragged = format!(
            "={}{}+{}{}",
            left,
            row + shift,
            right,
            row + 1 + shift
        );

        let (key_a, _) = compute_pattern(&original, "S", col, row);
        let (key_b, _) = compute_pattern(&dragged, "S", col, row + shift);
        prop_assert_eq!(key_a, key_b);
    }

    /// A column shift without the matching host shift never matches
    #[test]
    fn pattern_key_changes_with_offset(
        col in 3u32..20,
        row in 1u32..100,
    ) {
        let f = format!("={}{}*2", column_to_letters(col - 1), row);
        let (key_a, _) = compute_pattern(&f, "S", col, row);
        let (key_b, _) = compute_pattern(&f, "S", col - 1, row);
        prop_assert_ne!(key_a, key_b);
    }

    /// group_formulas partitions its input exactly
    #[test]
    fn grouping_partitions_exactly(
        rows in proptest::collection::btree_set(1u32..40, 1..20),
        col in 2u32..10,
    ) {
        let cells: Vec<(CellAddress, String)> = rows
            .iter()
            .map(|&r| (CellAddress::new("S", col, r), format!("=A{}*2", r)))
            .collect();

        let (groups, singles) = group_formulas(&cells);

        let mut seen: Vec<CellAddress> = groups
            .iter()
            .flat_map(|g| g.cells.clone())
            .chain(singles.iter().map(|s| s.cell.clone()))
            .collect();
        let total = seen.len();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(total, seen.len(), "a cell was claimed twice");
        prop_assert_eq!(total, cells.len(), "a cell was dropped");

        for group in &groups {
            prop_assert!(group.cells.len() >= 2);
        }
    }

    /// Every edge of an acyclic chain is respected by the schedule
    #[test]
    fn chain_order_respects_edges(n in 2u32..30) {
        let cells: Vec<(CellAddress, Vec<_>)> = (1..=n)
            .map(|r| {
                let formula = if r == 1 {
                    "=1+1".to_string()
                } else {
                    format!("=A{}+1", r - 1)
                };
                (CellAddress::new("S", 1, r), extract_references(&formula, "S"))
            })
            .collect();

        let graph = DependencyGraph::build(&cells, &TableIndex::new());
        let schedule = graph.topo_order();
        prop_assert!(schedule.cycles.is_empty());

        let pos = schedule.positions();
        for r in 2..=n {
            let before = &CellAddress::new("S", 1, r - 1);
            let after = &CellAddress::new("S", 1, r);
            prop_assert!(pos[before] < pos[after]);
        }
    }
}
