//! End-to-end compilation pipeline
//!
//! Runs the engine phases in order - resolve, translate/graph, schedule,
//! group, emit - over an immutable snapshot and collects everything a
//! writer needs: the ordered plan, the rendered script, group summaries,
//! reference analysis and the flat diagnostics list.
//!
//! The phase boundaries are also the recommended cancellation checkpoints
//! for callers that wrap the run with a timeout; each phase logs a debug
//! checkpoint when it completes.

use sheetc_core::{CellAddress, WorkbookSnapshot};
use sheetc_engine::analysis::{
    analyze_references, classify_inputs, discover_external_files, InputUsage, ReferenceAnalysis,
};
use sheetc_engine::emit::emit_script;
use sheetc_engine::graph::DependencyGraph;
use sheetc_engine::group::{group_formulas, SingleCell};
use sheetc_engine::plan::{order_items, EvaluationPlan, GroupDescriptor};
use sheetc_engine::resolve::{extract_references, Reference};
use sheetc_engine::tables::TableIndex;
use sheetc_engine::{CompileError, CompileResult, Diagnostic, DiagnosticKind};
use std::collections::BTreeMap;

/// Compilation switches
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Collapse dragged formulas into loops (on by default); when off,
    /// every formula cell becomes a scalar assignment
    pub vectorize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { vectorize: true }
    }
}

/// Counters for one compilation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub formula_cells: usize,
    pub groups: usize,
    /// Formula cells covered by groups
    pub grouped_cells: usize,
    pub singles: usize,
    pub cycle_cells: usize,
    pub cross_sheet_refs: usize,
    pub external_refs: usize,
    pub external_files: usize,
}

/// Everything produced by one compilation run
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Dependency-ordered groups and singles
    pub plan: EvaluationPlan,
    /// The rendered Python script
    pub script: String,
    /// All degradations, in detection order
    pub diagnostics: Vec<Diagnostic>,
    /// Group summaries in plan order
    pub groups: Vec<GroupDescriptor>,
    /// Cross-sheet / external usage records
    pub analysis: ReferenceAnalysis,
    /// External workbook file → referencing cells
    pub external_files: BTreeMap<String, Vec<CellAddress>>,
    /// Hardcoded inputs split by referenced/unreferenced
    pub inputs: InputUsage,
    pub stats: CompileStats,
}

/// Compiles one snapshot
pub struct Compiler<'a> {
    snapshot: &'a WorkbookSnapshot,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(snapshot: &'a WorkbookSnapshot) -> Self {
        Self {
            snapshot,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(snapshot: &'a WorkbookSnapshot, options: CompileOptions) -> Self {
        Self { snapshot, options }
    }

    /// Run the full pipeline
    ///
    /// Only a structurally unusable snapshot fails; everything else
    /// degrades into diagnostics.
    pub fn compile(&self) -> CompileResult<CompileOutput> {
        if self.snapshot.is_empty() {
            return Err(CompileError::EmptyWorkbook);
        }

        let tables = TableIndex::from_snapshot(self.snapshot);
        let cells: Vec<(CellAddress, String)> = self
            .snapshot
            .formula_cells()
            .into_iter()
            .map(|(addr, record)| (addr, record.content.clone()))
            .collect();

        // Phase: resolve
        let resolved: Vec<(CellAddress, String, Vec<Reference>)> = cells
            .iter()
            .map(|(addr, formula)| {
                (
                    addr.clone(),
                    formula.clone(),
                    extract_references(formula, &addr.sheet),
                )
            })
            .collect();
        log::debug!("resolve: {} formula cells", resolved.len());

        // Phase: graph
        let graph_input: Vec<(CellAddress, Vec<Reference>)> = resolved
            .iter()
            .map(|(addr, _, refs)| (addr.clone(), refs.clone()))
            .collect();
        let graph = DependencyGraph::build(&graph_input, &tables);
        log::debug!("graph: {} edges", graph.edge_count());

        // Phase: schedule
        let schedule = graph.topo_order();
        let mut diagnostics = Vec::new();
        if !schedule.cycles.is_empty() {
            let members: Vec<String> =
                schedule.cycles.iter().map(|c| c.to_string()).collect();
            diagnostics.push(Diagnostic::global(
                DiagnosticKind::CycleDetected,
                format!(
                    "circular references among {} cells: {}",
                    schedule.cycles.len(),
                    members.join(", ")
                ),
            ));
        }
        log::debug!(
            "schedule: {} cells ordered, {} cyclic",
            schedule.order.len(),
            schedule.cycles.len()
        );

        // Phase: group
        let (groups, singles) = if self.options.vectorize {
            group_formulas(&cells)
        } else {
            let singles = cells
                .iter()
                .map(|(addr, formula)| SingleCell {
                    cell: addr.clone(),
                    formula: formula.clone(),
                })
                .collect();
            (Vec::new(), singles)
        };
        log::debug!("group: {} groups, {} singles", groups.len(), singles.len());

        let plan = order_items(groups, singles, &graph);
        let descriptors: Vec<GroupDescriptor> =
            plan.groups().map(GroupDescriptor::from_group).collect();

        // Phase: emit
        let emitted = emit_script(&plan, &tables);
        diagnostics.extend(emitted.diagnostics);
        log::debug!("emit: {} bytes", emitted.script.len());

        let analysis = analyze_references(&resolved);
        let external_files = discover_external_files(&resolved);
        let inputs = classify_inputs(self.snapshot, &resolved, &tables);

        let stats = CompileStats {
            formula_cells: cells.len(),
            groups: descriptors.len(),
            grouped_cells: descriptors.iter().map(|d| d.member_count).sum(),
            singles: plan.items.len() - descriptors.len(),
            cycle_cells: schedule.cycles.len(),
            cross_sheet_refs: analysis.cross_sheet.len(),
            external_refs: analysis.external.len(),
            external_files: external_files.len(),
        };

        Ok(CompileOutput {
            plan,
            script: emitted.script,
            diagnostics,
            groups: descriptors,
            analysis,
            external_files,
            inputs,
            stats,
        })
    }
}

/// Compile a snapshot with default options
pub fn compile(snapshot: &WorkbookSnapshot) -> CompileResult<CompileOutput> {
    Compiler::new(snapshot).compile()
}
