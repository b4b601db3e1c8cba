//! Reference analysis
//!
//! Summary data for human-readable reporting: which external workbooks a
//! snapshot reaches into, where formulas cross sheet boundaries, and which
//! hardcoded inputs are actually read by a formula.

use crate::graph::expand_reference;
use crate::resolve::{RefKind, Reference};
use crate::tables::TableIndex;
use ahash::AHashSet;
use sheetc_core::{CellAddress, ContentKind, WorkbookSnapshot};
use std::collections::BTreeMap;

/// One cross-sheet usage record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossSheetRef {
    pub cell: CellAddress,
    pub formula: String,
    pub target_sheet: String,
    pub kind: RefKind,
}

/// One external-workbook usage record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalRef {
    pub cell: CellAddress,
    pub formula: String,
    pub external_file: String,
    pub external_sheet: String,
    pub kind: RefKind,
}

/// Cross-sheet and external usage across the workbook
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceAnalysis {
    pub cross_sheet: Vec<CrossSheetRef>,
    pub external: Vec<ExternalRef>,
}

/// Analyze resolved formula cells for cross-sheet and external usage
pub fn analyze_references(
    cells: &[(CellAddress, String, Vec<Reference>)],
) -> ReferenceAnalysis {
    let mut analysis = ReferenceAnalysis::default();
    for (cell, formula, references) in cells {
        for reference in references {
            if let Some(file) = &reference.external_file {
                analysis.external.push(ExternalRef {
                    cell: cell.clone(),
                    formula: formula.clone(),
                    external_file: file.clone(),
                    external_sheet: reference.sheet.clone(),
                    kind: reference.kind(),
                });
            } else if reference.kind() != RefKind::Table && reference.sheet != cell.sheet {
                analysis.cross_sheet.push(CrossSheetRef {
                    cell: cell.clone(),
                    formula: formula.clone(),
                    target_sheet: reference.sheet.clone(),
                    kind: reference.kind(),
                });
            }
        }
    }
    analysis
}

/// Map each referenced external workbook file to the cells referencing it
///
/// Sorted by file name for stable reporting.
pub fn discover_external_files(
    cells: &[(CellAddress, String, Vec<Reference>)],
) -> BTreeMap<String, Vec<CellAddress>> {
    let mut files: BTreeMap<String, Vec<CellAddress>> = BTreeMap::new();
    for (cell, _formula, references) in cells {
        for reference in references {
            if let Some(file) = &reference.external_file {
                let entry = files.entry(file.clone()).or_default();
                if !entry.contains(cell) {
                    entry.push(cell.clone());
                }
            }
        }
    }
    files
}

/// Hardcoded inputs split by whether any formula reads them
#[derive(Debug, Clone, Default)]
pub struct InputUsage {
    /// Read by at least one formula, sorted by address
    pub referenced: Vec<CellAddress>,
    /// Read by nothing, sorted by address
    pub unreferenced: Vec<CellAddress>,
}

/// Classify the snapshot's hardcoded numeric inputs
pub fn classify_inputs(
    snapshot: &WorkbookSnapshot,
    cells: &[(CellAddress, String, Vec<Reference>)],
    tables: &TableIndex,
) -> InputUsage {
    let mut read: AHashSet<CellAddress> = AHashSet::new();
    for (_cell, _formula, references) in cells {
        for reference in references {
            read.extend(expand_reference(reference, tables));
        }
    }

    let mut usage = InputUsage::default();
    for sheet in snapshot.sheets() {
        for record in sheet.cells() {
            if record.kind != ContentKind::HardcodedNumber {
                continue;
            }
            let address = CellAddress::from_coord(sheet.name.as_str(), record.coord);
            if read.contains(&address) {
                usage.referenced.push(address);
            } else {
                usage.unreferenced.push(address);
            }
        }
    }
    usage.referenced.sort();
    usage.unreferenced.sort();
    usage
}
