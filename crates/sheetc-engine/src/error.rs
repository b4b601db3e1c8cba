//! Engine error types
//!
//! Almost nothing in the engine is fatal: malformed formulas, unknown
//! functions and circular references all degrade into [`crate::Diagnostic`]s.
//! The error types here cover the few conditions that cannot degrade.

use thiserror::Error;

/// Result type for compilation
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Structural failures that abort a compilation run
#[derive(Debug, Error)]
pub enum CompileError {
    /// The snapshot holds no sheets at all; nothing can be compiled
    #[error("workbook snapshot contains no sheets")]
    EmptyWorkbook,
}

/// Per-formula translation failures
///
/// These never abort a run: the emitter catches them and substitutes a
/// fallback assignment for the affected cell.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A string literal ran to the end of the formula without closing
    #[error("unterminated string literal")]
    UnterminatedString,
}
