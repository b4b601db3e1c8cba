//! Vectorizer/grouper
//!
//! Buckets formula cells by pattern key and collapses each bucket into
//! maximal contiguous runs: vertical runs (same column, consecutive rows)
//! are claimed first, then horizontal runs (same row, consecutive columns)
//! among the cells left over. Vertical-before-horizontal is a deliberate
//! tie-break; a cell belongs to at most one group. Runs shorter than two
//! cells, and cells claimed by no run, come back as singles.
//!
//! The partition is exact: every input cell appears in exactly one group
//! or exactly one single.

use crate::pattern::{compute_pattern, PatternKey};
use ahash::AHashMap;
use sheetc_core::CellAddress;
use std::collections::BTreeMap;

/// Run direction of a vectorized group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Vertical,
    Horizontal,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Vertical => "vertical",
            Direction::Horizontal => "horizontal",
        })
    }
}

/// One maximal contiguous run of drag-equivalent formulas
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaGroup {
    pub direction: Direction,
    /// Member cells in run order (top-to-bottom or left-to-right)
    pub cells: Vec<CellAddress>,
    /// The first member's formula, used for the whole group
    pub representative: String,
    /// The shared pattern
    pub pattern: PatternKey,
}

impl FormulaGroup {
    /// First member (the anchor)
    pub fn anchor(&self) -> &CellAddress {
        &self.cells[0]
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A formula cell that joined no group
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleCell {
    pub cell: CellAddress,
    pub formula: String,
}

/// Partition formula cells into vectorizable groups and singles
///
/// Input order determines bucket order, so the output is deterministic
/// for a deterministic input (the snapshot provides cells sorted by
/// sheet, row, column).
pub fn group_formulas(cells: &[(CellAddress, String)]) -> (Vec<FormulaGroup>, Vec<SingleCell>) {
    // Bucket by pattern key, preserving first-seen order
    let mut bucket_index: AHashMap<PatternKey, usize> = AHashMap::new();
    let mut buckets: Vec<(PatternKey, Vec<usize>)> = Vec::new();

    for (index, (addr, formula)) in cells.iter().enumerate() {
        let (key, _refs) = compute_pattern(formula, &addr.sheet, addr.col, addr.row);
        match bucket_index.get(&key) {
            Some(&b) => buckets[b].1.push(index),
            None => {
                bucket_index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![index]));
            }
        }
    }

    let mut groups = Vec::new();
    let mut singles = Vec::new();
    let mut used = vec![false; cells.len()];

    for (key, members) in &buckets {
        if members.len() < 2 {
            continue; // falls through to the singles sweep below
        }

        // Vertical runs: same column, consecutive rows
        let mut by_col: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for &i in members {
            by_col.entry(cells[i].0.col).or_default().push(i);
        }
        for (_col, mut col_cells) in by_col {
            col_cells.sort_by_key(|&i| cells[i].0.row);
            for run in contiguous_runs(&col_cells, |a, b| cells[b].0.row == cells[a].0.row + 1) {
                if run.len() >= 2 {
                    for &i in &run {
                        used[i] = true;
                    }
                    groups.push(make_group(Direction::Vertical, &run, cells, key));
                }
            }
        }

        // Horizontal runs among the cells no vertical run claimed
        let mut by_row: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for &i in members {
            if !used[i] {
                by_row.entry(cells[i].0.row).or_default().push(i);
            }
        }
        for (_row, mut row_cells) in by_row {
            row_cells.sort_by_key(|&i| cells[i].0.col);
            for run in contiguous_runs(&row_cells, |a, b| cells[b].0.col == cells[a].0.col + 1) {
                if run.len() >= 2 {
                    for &i in &run {
                        used[i] = true;
                    }
                    groups.push(make_group(Direction::Horizontal, &run, cells, key));
                }
            }
        }
    }

    // Everything unclaimed is a single, in input order
    for (index, (addr, formula)) in cells.iter().enumerate() {
        if !used[index] {
            singles.push(SingleCell {
                cell: addr.clone(),
                formula: formula.clone(),
            });
        }
    }

    (groups, singles)
}

fn make_group(
    direction: Direction,
    run: &[usize],
    cells: &[(CellAddress, String)],
    key: &PatternKey,
) -> FormulaGroup {
    FormulaGroup {
        direction,
        cells: run.iter().map(|&i| cells[i].0.clone()).collect(),
        representative: cells[run[0]].1.clone(),
        pattern: key.clone(),
    }
}

/// Split a sorted slice into maximal runs where `adjacent(prev, next)`
fn contiguous_runs(sorted: &[usize], adjacent: impl Fn(usize, usize) -> bool) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &i in sorted {
        match runs.last_mut() {
            Some(run) if adjacent(*run.last().expect("runs are never empty"), i) => run.push(i),
            _ => runs.push(vec![i]),
        }
    }
    runs
}
