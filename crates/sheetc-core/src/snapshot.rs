//! Immutable workbook snapshot
//!
//! The external loader builds a [`WorkbookSnapshot`] once per conversion
//! run; the engine treats it as read-only input. Sheet order is the
//! workbook's own tab order and is preserved.

use crate::address::{CellAddress, CellCoord};
use crate::error::{Error, Result};
use crate::record::{CellRecord, ContentKind};
use crate::table::Table;
use ahash::AHashMap;

/// All captured cells of one sheet
#[derive(Debug, Clone, Default)]
pub struct SheetSnapshot {
    /// Sheet name as shown on the tab
    pub name: String,
    cells: AHashMap<CellCoord, CellRecord>,
}

impl SheetSnapshot {
    /// Create an empty sheet snapshot
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: AHashMap::new(),
        }
    }

    /// Insert a captured cell (loader-side only)
    pub fn insert(&mut self, record: CellRecord) {
        self.cells.insert(record.coord, record);
    }

    /// Look up a cell by coordinate
    pub fn cell(&self, coord: CellCoord) -> Option<&CellRecord> {
        self.cells.get(&coord)
    }

    /// Iterate over all captured cells (unordered)
    pub fn cells(&self) -> impl Iterator<Item = &CellRecord> {
        self.cells.values()
    }

    /// Iterate over formula cells (unordered)
    pub fn formula_cells(&self) -> impl Iterator<Item = &CellRecord> {
        self.cells
            .values()
            .filter(|r| r.kind == ContentKind::Formula)
    }

    /// Number of captured cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cells were captured
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The immutable workbook view consumed by the engine
#[derive(Debug, Clone, Default)]
pub struct WorkbookSnapshot {
    sheets: Vec<SheetSnapshot>,
    tables: AHashMap<String, Table>,
}

impl WorkbookSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, returning a mutable handle for the loader to fill
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<&mut SheetSnapshot> {
        let name = name.into();
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(Error::DuplicateSheet(name));
        }
        self.sheets.push(SheetSnapshot::new(name));
        Ok(self.sheets.last_mut().expect("just pushed"))
    }

    /// Register table metadata
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Sheets in workbook tab order
    pub fn sheets(&self) -> &[SheetSnapshot] {
        &self.sheets
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&SheetSnapshot> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Table metadata by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// All registered tables (unordered)
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// True when the snapshot holds no sheets at all
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Look up a cell by global address
    pub fn cell(&self, address: &CellAddress) -> Option<&CellRecord> {
        self.sheet(&address.sheet)?.cell(address.coord())
    }

    /// All formula cells across the workbook, in deterministic order
    /// (sheet tab order, then row, then column)
    pub fn formula_cells(&self) -> Vec<(CellAddress, &CellRecord)> {
        let mut out = Vec::new();
        for sheet in &self.sheets {
            let mut records: Vec<&CellRecord> = sheet.formula_cells().collect();
            records.sort_by_key(|r| (r.coord.row, r.coord.col));
            for record in records {
                out.push((
                    CellAddress::from_coord(sheet.name.as_str(), record.coord),
                    record,
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_lookup() {
        let mut wb = WorkbookSnapshot::new();
        let sheet = wb.add_sheet("Sheet1").unwrap();
        sheet.insert(CellRecord::new(CellCoord::new(1, 1), "10"));
        sheet.insert(CellRecord::new(CellCoord::new(1, 2), "=A1*2"));

        assert!(wb.sheet("Sheet1").is_some());
        assert!(wb.sheet("Nope").is_none());

        let addr = CellAddress::new("Sheet1", 1, 2);
        assert_eq!(wb.cell(&addr).unwrap().content, "=A1*2");
    }

    #[test]
    fn test_duplicate_sheet_rejected() {
        let mut wb = WorkbookSnapshot::new();
        wb.add_sheet("S").unwrap();
        assert!(wb.add_sheet("S").is_err());
    }

    #[test]
    fn test_formula_cells_ordered() {
        let mut wb = WorkbookSnapshot::new();
        let sheet = wb.add_sheet("S").unwrap();
        sheet.insert(CellRecord::new(CellCoord::new(2, 3), "=A1"));
        sheet.insert(CellRecord::new(CellCoord::new(1, 3), "=A1"));
        sheet.insert(CellRecord::new(CellCoord::new(1, 1), "=B2"));
        sheet.insert(CellRecord::new(CellCoord::new(1, 2), "label"));

        let cells: Vec<String> = wb
            .formula_cells()
            .iter()
            .map(|(a, _)| a.to_string())
            .collect();
        assert_eq!(cells, vec!["S!A1", "S!A3", "S!B3"]);
    }
}
