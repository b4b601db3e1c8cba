//! Structured-table metadata
//!
//! Tables let formulas reference a named column (`Sales[Amount]`) instead
//! of raw coordinates. The engine resolves such references against this
//! metadata; it never inspects the table's cell contents itself.

use crate::address::CellCoord;

/// Metadata for one worksheet table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    /// Table name, unique per workbook
    pub name: String,
    /// Owning sheet
    pub sheet: String,
    /// Row holding the column headers (1-based)
    pub header_row: u32,
    /// First data row (1-based, inclusive)
    pub data_start_row: u32,
    /// Last data row (1-based, inclusive)
    pub data_end_row: u32,
    /// Column index of the first table column (1-based)
    pub start_col: u32,
    /// Column names in sheet order
    pub columns: Vec<String>,
}

impl Table {
    /// Position of a named column within the table
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Absolute sheet column for a named table column
    pub fn column_coord(&self, column: &str) -> Option<u32> {
        self.column_index(column)
            .map(|i| self.start_col + i as u32)
    }

    /// Cell coordinates of a named column's data cells, top to bottom
    pub fn column_cells(&self, column: &str) -> Option<Vec<CellCoord>> {
        let col = self.column_coord(column)?;
        Some(
            (self.data_start_row..=self.data_end_row)
                .map(|row| CellCoord::new(col, row))
                .collect(),
        )
    }

    /// Number of data rows
    pub fn data_row_count(&self) -> u32 {
        self.data_end_row.saturating_sub(self.data_start_row) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            name: "Sales".into(),
            sheet: "Data".into(),
            header_row: 1,
            data_start_row: 2,
            data_end_row: 5,
            start_col: 2, // column B
            columns: vec!["Region".into(), "Amount".into()],
        }
    }

    #[test]
    fn test_column_lookup() {
        let t = sample();
        assert_eq!(t.column_index("Region"), Some(0));
        assert_eq!(t.column_coord("Amount"), Some(3)); // column C
        assert_eq!(t.column_coord("Missing"), None);
    }

    #[test]
    fn test_column_cells() {
        let t = sample();
        let cells = t.column_cells("Amount").unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], CellCoord::new(3, 2));
        assert_eq!(cells[3], CellCoord::new(3, 5));
    }
}
