//! Structured diagnostics
//!
//! Every degradation the engine performs is reported here rather than
//! silently swallowed: parse fallbacks, unknown function names, circular
//! references, per-cell translation failures.

use sheetc_core::CellAddress;
use std::fmt;

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// An unrecognized formula fragment was passed through untranslated
    ParseError,
    /// A function name was absent from the mapping catalog
    UnknownFunction,
    /// Formula cells form a dependency cycle
    CycleDetected,
    /// Per-cell code generation failed; a fallback assignment was emitted
    TranslationFailure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::UnknownFunction => "unknown-function",
            DiagnosticKind::CycleDetected => "cycle-detected",
            DiagnosticKind::TranslationFailure => "translation-failure",
        };
        f.write_str(s)
    }
}

/// One reported degradation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// The affected cell; `None` for workbook-level findings (e.g. a cycle
    /// spanning many cells lists its members in the message instead)
    pub cell: Option<CellAddress>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic attached to a specific cell
    pub fn for_cell(cell: CellAddress, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            cell: Some(cell),
            kind,
            message: message.into(),
        }
    }

    /// Workbook-level diagnostic
    pub fn global(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            cell: None,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Some(cell) => write!(f, "[{}] {}: {}", self.kind, cell, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
