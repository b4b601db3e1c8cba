//! Dependency graph and evaluation scheduler
//!
//! Nodes are formula-cell addresses only. Every consumed range/table
//! reference is expanded to its constituent cell addresses before
//! membership testing; reads of literal input cells do not become edges.
//!
//! Scheduling is Kahn's algorithm with sorted seeds and sorted adjacency,
//! so the evaluation order is fully deterministic. Cells that never reach
//! in-degree zero form cycles; they are appended afterwards in
//! lexicographic (sheet, row, col) order and reported through a
//! cycle diagnostic, never an error.

use crate::resolve::{RefTarget, Reference};
use crate::tables::TableIndex;
use ahash::{AHashMap, AHashSet};
use sheetc_core::CellAddress;
use std::collections::VecDeque;

/// Expand a reference to the workbook cells it reads
///
/// External references expand to nothing: their cells live outside this
/// workbook and can never be formula nodes.
pub fn expand_reference(reference: &Reference, tables: &TableIndex) -> Vec<CellAddress> {
    if reference.external_file.is_some() {
        return Vec::new();
    }
    match &reference.target {
        RefTarget::Cell(c) => vec![CellAddress::new(&*reference.sheet, c.col, c.row)],
        RefTarget::Range(start, end) => {
            let (col_lo, col_hi) = (start.col.min(end.col), start.col.max(end.col));
            let (row_lo, row_hi) = (start.row.min(end.row), start.row.max(end.row));
            let mut cells = Vec::with_capacity(
                ((col_hi - col_lo + 1) * (row_hi - row_lo + 1)) as usize,
            );
            for row in row_lo..=row_hi {
                for col in col_lo..=col_hi {
                    cells.push(CellAddress::new(&*reference.sheet, col, row));
                }
            }
            cells
        }
        RefTarget::Table { table, column } => match tables.get(table) {
            Some(t) => match t.column_cells(column) {
                Some(coords) => coords
                    .into_iter()
                    .map(|coord| CellAddress::from_coord(t.sheet.as_str(), coord))
                    .collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        },
    }
}

/// Cell-level dependency graph over formula cells
///
/// An edge u → v means v reads u's computed result.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<CellAddress>,
    /// v → cells v reads (formula cells only)
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// u → cells reading u
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

impl DependencyGraph {
    /// Build the graph from resolved formula cells
    ///
    /// `cells` pairs each formula cell with its consumed references.
    pub fn build(cells: &[(CellAddress, Vec<Reference>)], tables: &TableIndex) -> Self {
        let node_set: AHashSet<CellAddress> =
            cells.iter().map(|(addr, _)| addr.clone()).collect();
        let mut graph = Self {
            nodes: cells.iter().map(|(addr, _)| addr.clone()).collect(),
            precedents: AHashMap::new(),
            dependents: AHashMap::new(),
        };

        for (addr, references) in cells {
            for reference in references {
                for source in expand_reference(reference, tables) {
                    // Only reads of other formula cells are edges
                    if source == *addr || !node_set.contains(&source) {
                        continue;
                    }
                    graph
                        .precedents
                        .entry(addr.clone())
                        .or_default()
                        .insert(source.clone());
                    graph
                        .dependents
                        .entry(source)
                        .or_default()
                        .insert(addr.clone());
                }
            }
        }

        graph
    }

    /// All formula-cell nodes, in insertion order
    pub fn nodes(&self) -> &[CellAddress] {
        &self.nodes
    }

    /// Formula cells the given cell reads
    pub fn precedents(&self, cell: &CellAddress) -> impl Iterator<Item = &CellAddress> {
        self.precedents.get(cell).into_iter().flatten()
    }

    /// Formula cells reading the given cell
    pub fn dependents(&self, cell: &CellAddress) -> impl Iterator<Item = &CellAddress> {
        self.dependents.get(cell).into_iter().flatten()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.precedents.values().map(|s| s.len()).sum()
    }

    /// Compute the evaluation order
    ///
    /// Returns the scheduled order plus the cells that were left in cycles
    /// (appended at the end of the order, sorted lexicographically). Every
    /// node appears in the order exactly once.
    pub fn topo_order(&self) -> Schedule {
        let mut in_degree: AHashMap<&CellAddress, usize> = AHashMap::new();
        for node in &self.nodes {
            in_degree.insert(node, self.precedents.get(node).map_or(0, |p| p.len()));
        }

        let mut seeds: Vec<&CellAddress> = self
            .nodes
            .iter()
            .filter(|n| in_degree[*n] == 0)
            .collect();
        seeds.sort();

        let mut queue: VecDeque<&CellAddress> = seeds.into();
        let mut order: Vec<CellAddress> = Vec::with_capacity(self.nodes.len());
        let mut done: AHashSet<&CellAddress> = AHashSet::new();

        while let Some(cell) = queue.pop_front() {
            if !done.insert(cell) {
                continue;
            }
            order.push(cell.clone());

            let mut next: Vec<&CellAddress> = self
                .dependents
                .get(cell)
                .into_iter()
                .flatten()
                .collect();
            next.sort();
            for dependent in next {
                let d = in_degree.get_mut(dependent).expect("known node");
                *d = d.saturating_sub(1);
                if *d == 0 && !done.contains(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        let mut cycles: Vec<CellAddress> = self
            .nodes
            .iter()
            .filter(|n| !done.contains(*n))
            .cloned()
            .collect();
        cycles.sort();
        if !cycles.is_empty() {
            log::warn!(
                "{} formula cells form circular references; scheduling them in address order",
                cycles.len()
            );
        }
        order.extend(cycles.iter().cloned());

        Schedule { order, cycles }
    }
}

/// Result of scheduling
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Complete evaluation order (cyclic cells last)
    pub order: Vec<CellAddress>,
    /// Members of dependency cycles, lexicographically sorted
    pub cycles: Vec<CellAddress>,
}

impl Schedule {
    /// Position of each cell in the order
    pub fn positions(&self) -> AHashMap<&CellAddress, usize> {
        self.order.iter().enumerate().map(|(i, c)| (c, i)).collect()
    }
}
