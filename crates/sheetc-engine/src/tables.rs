//! Table metadata lookup
//!
//! The engine resolves structured references (`Sales[Amount]`) against a
//! [`TableIndex`] built once per compilation run from the snapshot's table
//! metadata.

use ahash::AHashMap;
use sheetc_core::{Table, WorkbookSnapshot};

/// Name → table metadata index
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    tables: AHashMap<String, Table>,
}

impl TableIndex {
    /// Empty index (no structured references resolve)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot's registered tables
    pub fn from_snapshot(snapshot: &WorkbookSnapshot) -> Self {
        let mut tables = AHashMap::new();
        for table in snapshot.tables() {
            tables.insert(table.name.clone(), table.clone());
        }
        Self { tables }
    }

    /// Register one table (test helper / incremental build)
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table by name
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// True when no tables are registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
