//! # sheetc-core
//!
//! Core data structures for the sheetc formula compiler.
//!
//! This crate provides the fundamental types shared by the compilation
//! engine and its callers:
//! - [`CellCoord`] and [`CellAddress`] - 1-based cell coordinates with
//!   bidirectional column-letter conversion
//! - [`CellRecord`] - an immutable snapshot of one cell (content,
//!   classification, formatting)
//! - [`Table`] - structured-table metadata
//! - [`WorkbookSnapshot`] and [`SheetSnapshot`] - the immutable workbook
//!   view the engine compiles from
//!
//! ## Example
//!
//! ```rust
//! use sheetc_core::{CellCoord, CellRecord, WorkbookSnapshot};
//!
//! let mut snapshot = WorkbookSnapshot::new();
//! let sheet = snapshot.add_sheet("Sheet1").unwrap();
//! sheet.insert(CellRecord::new(CellCoord::new(1, 1), "10"));
//! sheet.insert(CellRecord::new(CellCoord::new(1, 2), "=A1*2"));
//! ```

pub mod address;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod table;

// Re-exports for convenience
pub use address::{column_to_letters, letters_to_column, CellAddress, CellCoord};
pub use error::{Error, Result};
pub use record::{AlignmentSnapshot, CellRecord, ContentKind, FontSnapshot, FormatSnapshot};
pub use snapshot::{SheetSnapshot, WorkbookSnapshot};
pub use table::Table;

/// Maximum number of rows in a worksheet (Excel limit, 1-based)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit, 1-based)
pub const MAX_COLS: u32 = 16_384;
