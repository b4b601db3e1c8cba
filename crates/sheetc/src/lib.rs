//! # sheetc
//!
//! Compiles spreadsheet formula cells into an equivalent,
//! dependency-ordered executable computation.
//!
//! Given an immutable workbook snapshot (from an external loader), sheetc
//! parses every formula, builds the cell-level dependency graph, detects
//! dragged formula runs and collapses them into loops, and emits a Python
//! script that evaluates the whole workbook dependencies-first. Malformed
//! formulas, unknown functions and circular references degrade into
//! structured diagnostics; they never abort a run.
//!
//! ## Example
//!
//! ```rust
//! use sheetc::prelude::*;
//!
//! let mut snapshot = WorkbookSnapshot::new();
//! let sheet = snapshot.add_sheet("Sheet1").unwrap();
//! sheet.insert(CellRecord::new(CellCoord::new(1, 1), "10"));
//! sheet.insert(CellRecord::new(CellCoord::new(1, 2), "20"));
//! sheet.insert(CellRecord::new(CellCoord::new(2, 1), "=A1+A2"));
//!
//! let output = compile(&snapshot).unwrap();
//! assert!(output.script.contains("def compute(c):"));
//! assert!(output.diagnostics.is_empty());
//! ```

pub mod pipeline;
pub mod prelude;

pub use pipeline::{compile, CompileOptions, CompileOutput, CompileStats, Compiler};

// Re-export core types
pub use sheetc_core::{
    column_to_letters, letters_to_column, CellAddress, CellCoord, CellRecord, ContentKind,
    FormatSnapshot, SheetSnapshot, Table, WorkbookSnapshot,
};

// Re-export engine types
pub use sheetc_engine::{
    analyze_references, classify_inputs, compute_pattern, discover_external_files,
    extract_references, group_formulas, translate, CompileError, Diagnostic, DiagnosticKind,
    Direction, EvaluationPlan, FormulaGroup, GroupDescriptor, PatternKey, PlanItem, RefKind,
    RefStyle, Reference, SingleCell, TableIndex, TranslateContext, Translation,
};
