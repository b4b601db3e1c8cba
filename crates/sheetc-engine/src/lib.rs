//! # sheetc-engine
//!
//! The formula compilation engine: turns a workbook snapshot's formula
//! cells into a dependency-ordered, vectorized evaluation plan and renders
//! it as executable code.
//!
//! Pipeline stages, in data-flow order:
//! - [`resolve`] - extract every cell/range/table/external reference from
//!   a formula, with absolute/relative markers and source spans
//! - [`translate`] - tokenize and translate formula syntax into target
//!   expressions, recording consumed references
//! - [`pattern`] - compute drag-equivalence keys so copied formulas are
//!   recognized as one pattern
//! - [`graph`] - build the cell-level dependency graph and schedule a
//!   topological evaluation order (cycles degrade, never abort)
//! - [`group`] - collapse pattern-equal cells into contiguous vertical or
//!   horizontal runs
//! - [`plan`] - order groups and singles into an [`plan::EvaluationPlan`]
//! - [`emit`] - render the plan as a Python script with the embedded
//!   runtime prelude
//!
//! No stage mutates the snapshot, and no single malformed formula aborts a
//! run: degradations surface as [`Diagnostic`]s.

pub mod analysis;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod graph;
pub mod group;
pub mod pattern;
pub mod plan;
pub mod resolve;
pub mod tables;
pub mod translate;

pub use analysis::{
    analyze_references, classify_inputs, discover_external_files, InputUsage, ReferenceAnalysis,
};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use emit::{emit_script, EmitResult, Emitted};
pub use error::{CompileError, CompileResult, TranslateError};
pub use graph::{DependencyGraph, Schedule};
pub use group::{group_formulas, Direction, FormulaGroup, SingleCell};
pub use pattern::{compute_pattern, PatternKey};
pub use plan::{order_items, EvaluationPlan, GroupDescriptor, PlanItem};
pub use resolve::{extract_references, RefKind, RefTarget, Reference};
pub use tables::TableIndex;
pub use translate::{translate, RefStyle, TranslateContext, TranslateIssue, Translation};
