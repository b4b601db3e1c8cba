//! Core error types

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from core data-structure operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address string
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Row exceeds the worksheet limit
    #[error("Row {0} out of bounds (max {1})")]
    RowOutOfBounds(u32, u32),

    /// Column exceeds the worksheet limit
    #[error("Column {0} out of bounds (max {1})")]
    ColumnOutOfBounds(u32, u32),

    /// Sheet name already present in the snapshot
    #[error("Duplicate sheet name: {0}")]
    DuplicateSheet(String),

    /// Sheet name not present in the snapshot
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),
}
