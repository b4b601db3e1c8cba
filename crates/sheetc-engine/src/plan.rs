//! Evaluation plan
//!
//! The ordered sequence of groups and singles handed to the emitter. Item
//! order is derived from the cell-level dependency graph by edge
//! contraction: an item depends on another when any of its cells reads any
//! cell the other produces. Items caught in cycles are appended in their
//! construction order, mirroring the cell-level fallback policy.

use crate::graph::DependencyGraph;
use crate::group::{Direction, FormulaGroup, SingleCell};
use ahash::AHashMap;
use sheetc_core::CellAddress;
use std::collections::VecDeque;

/// One step of the plan
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanItem {
    Group(FormulaGroup),
    Single(SingleCell),
}

impl PlanItem {
    /// Cells this item computes
    pub fn produced(&self) -> Vec<&CellAddress> {
        match self {
            PlanItem::Group(g) => g.cells.iter().collect(),
            PlanItem::Single(s) => vec![&s.cell],
        }
    }
}

/// Dependency-ordered sequence of groups and singles
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationPlan {
    pub items: Vec<PlanItem>,
}

impl EvaluationPlan {
    /// Total number of cells across all items
    pub fn cell_count(&self) -> usize {
        self.items.iter().map(|i| i.produced().len()).sum()
    }

    /// Group items only
    pub fn groups(&self) -> impl Iterator<Item = &FormulaGroup> {
        self.items.iter().filter_map(|i| match i {
            PlanItem::Group(g) => Some(g),
            PlanItem::Single(_) => None,
        })
    }
}

/// Human-readable group summary for reporting
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupDescriptor {
    pub sheet: String,
    /// `D2:D6`-style anchor range covering the run
    pub anchor_range: String,
    pub direction: Direction,
    pub member_count: usize,
    pub representative_formula: String,
}

impl GroupDescriptor {
    pub fn from_group(group: &FormulaGroup) -> Self {
        let first = &group.cells[0];
        let last = group.cells.last().expect("groups are never empty");
        Self {
            sheet: first.sheet.clone(),
            anchor_range: format!(
                "{}{}:{}{}",
                first.col_letters(),
                first.row,
                last.col_letters(),
                last.row
            ),
            direction: group.direction,
            member_count: group.cells.len(),
            representative_formula: group.representative.clone(),
        }
    }
}

/// Order groups and singles into an evaluation plan
///
/// Kahn's algorithm over the contracted item graph; the cell graph's
/// partial order is preserved (if cell u must precede cell v, u's item
/// precedes v's unless both share an item or a cycle).
pub fn order_items(
    groups: Vec<FormulaGroup>,
    singles: Vec<SingleCell>,
    graph: &DependencyGraph,
) -> EvaluationPlan {
    let mut items: Vec<PlanItem> = Vec::with_capacity(groups.len() + singles.len());
    items.extend(groups.into_iter().map(PlanItem::Group));
    items.extend(singles.into_iter().map(PlanItem::Single));

    if items.is_empty() {
        return EvaluationPlan::default();
    }

    // Producing item of each cell
    let mut producer: AHashMap<&CellAddress, usize> = AHashMap::new();
    for (index, item) in items.iter().enumerate() {
        for cell in item.produced() {
            producer.insert(cell, index);
        }
    }

    // Contract cell edges to item edges
    let n = items.len();
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];
    for (index, item) in items.iter().enumerate() {
        let mut deps: Vec<usize> = item
            .produced()
            .into_iter()
            .flat_map(|cell| graph.precedents(cell))
            .filter_map(|dep| producer.get(dep).copied())
            .filter(|&p| p != index)
            .collect();
        deps.sort_unstable();
        deps.dedup();
        for p in deps {
            forward[p].push(index);
            in_degree[index] += 1;
        }
    }
    for next in &mut forward {
        next.sort_unstable();
    }

    // Kahn over items, seeded in construction order
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut done = vec![false; n];
    while let Some(i) = queue.pop_front() {
        if done[i] {
            continue;
        }
        done[i] = true;
        order.push(i);
        for &next in &forward[i] {
            in_degree[next] = in_degree[next].saturating_sub(1);
            if in_degree[next] == 0 && !done[next] {
                queue.push_back(next);
            }
        }
    }

    // Cyclic leftovers keep their construction order
    for i in 0..n {
        if !done[i] {
            order.push(i);
        }
    }

    let mut slots: Vec<Option<PlanItem>> = items.into_iter().map(Some).collect();
    EvaluationPlan {
        items: order
            .into_iter()
            .map(|i| slots[i].take().expect("each index scheduled once"))
            .collect(),
    }
}
