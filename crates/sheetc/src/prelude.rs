//! Convenience re-exports
//!
//! `use sheetc::prelude::*;` pulls in the types needed for typical use:
//! building a snapshot, compiling it, and inspecting the output.

pub use crate::pipeline::{compile, CompileOptions, CompileOutput, Compiler};
pub use sheetc_core::{
    CellAddress, CellCoord, CellRecord, ContentKind, SheetSnapshot, Table, WorkbookSnapshot,
};
pub use sheetc_engine::{
    Diagnostic, DiagnosticKind, Direction, EvaluationPlan, GroupDescriptor, PlanItem,
};
