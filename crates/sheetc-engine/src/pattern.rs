//! Pattern normalizer
//!
//! Computes a structural key for a formula so dragged copies are
//! recognized as equivalent. Absolute axes are encoded by literal value;
//! relative axes by the signed offset from the host cell's own position.
//! The skeleton is the formula body with each reference span replaced by a
//! positional `@N` placeholder, assembled in one linear pass over the
//! ascending spans.

use crate::resolve::{extract_references, RefCoord, RefTarget, Reference};

/// One axis of a reference as it appears in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisKey {
    /// `$`-anchored: the literal index
    Abs(u32),
    /// Relative: signed offset from the host cell
    Rel(i64),
}

impl AxisKey {
    fn of(value: u32, absolute: bool, base: u32) -> Self {
        if absolute {
            AxisKey::Abs(value)
        } else {
            AxisKey::Rel(value as i64 - base as i64)
        }
    }
}

/// Structural descriptor of one reference within a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefDescriptor {
    Cell {
        /// External workbook tag, if any
        external: Option<String>,
        /// Target sheet when it differs from the host sheet (or external)
        sheet: Option<String>,
        col: AxisKey,
        row: AxisKey,
    },
    Range {
        external: Option<String>,
        sheet: Option<String>,
        col: AxisKey,
        row: AxisKey,
        end_col: AxisKey,
        end_row: AxisKey,
    },
    Table {
        table: String,
        column: String,
    },
}

/// The drag-equivalence key
///
/// Two formulas are drag-equivalent iff their `PatternKey`s are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternKey {
    /// Host sheet
    pub sheet: String,
    /// Formula body with references replaced by `@N` placeholders
    pub skeleton: String,
    /// Per-reference descriptors, in source order
    pub refs: Vec<RefDescriptor>,
}

fn descriptor(reference: &Reference, current_sheet: &str, col: u32, row: u32) -> RefDescriptor {
    let external = reference.external_file.clone();
    let sheet = if reference.sheet != current_sheet || external.is_some() {
        Some(reference.sheet.clone())
    } else {
        None
    };

    let axis_pair = |c: &RefCoord| {
        (
            AxisKey::of(c.col, c.col_abs, col),
            AxisKey::of(c.row, c.row_abs, row),
        )
    };

    match &reference.target {
        RefTarget::Cell(c) => {
            let (col, row) = axis_pair(c);
            RefDescriptor::Cell {
                external,
                sheet,
                col,
                row,
            }
        }
        RefTarget::Range(start, end) => {
            let (col, row) = axis_pair(start);
            let (end_col, end_row) = axis_pair(end);
            RefDescriptor::Range {
                external,
                sheet,
                col,
                row,
                end_col,
                end_row,
            }
        }
        RefTarget::Table { table, column } => RefDescriptor::Table {
            table: table.clone(),
            column: column.clone(),
        },
    }
}

/// Compute the pattern key for a formula hosted at (`cell_col`, `cell_row`)
///
/// Also returns the extracted references so callers don't re-scan.
pub fn compute_pattern(
    formula: &str,
    current_sheet: &str,
    cell_col: u32,
    cell_row: u32,
) -> (PatternKey, Vec<Reference>) {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let references = extract_references(formula, current_sheet);

    let refs = references
        .iter()
        .map(|r| descriptor(r, current_sheet, cell_col, cell_row))
        .collect();

    // Spans are non-overlapping and sorted ascending, so the skeleton is
    // assembled in a single pass.
    let mut skeleton = String::with_capacity(body.len());
    let mut cursor = 0usize;
    for (idx, r) in references.iter().enumerate() {
        skeleton.push_str(&body[cursor..r.start]);
        skeleton.push('@');
        skeleton.push_str(&idx.to_string());
        cursor = r.end;
    }
    skeleton.push_str(&body[cursor..]);

    (
        PatternKey {
            sheet: current_sheet.to_string(),
            skeleton,
            refs,
        },
        references,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(formula: &str, col: u32, row: u32) -> PatternKey {
        compute_pattern(formula, "S", col, row).0
    }

    #[test]
    fn test_skeleton_placeholders() {
        let k = key("=A1+B1*2", 3, 1); // host C1
        assert_eq!(k.skeleton, "@0+@1*2");
        assert_eq!(k.refs.len(), 2);
    }

    #[test]
    fn test_row_drag_copies_are_equal() {
        // D2..D6 each holding =A{r}-B{r}: identical keys
        let k2 = key("=A2-B2", 4, 2);
        let k3 = key("=A3-B3", 4, 3);
        let k6 = key("=A6-B6", 4, 6);
        assert_eq!(k2, k3);
        assert_eq!(k2, k6);
    }

    #[test]
    fn test_different_structures_never_equal() {
        let a = key("=A2-B2", 4, 2);
        let b = key("=A2+B2", 4, 2);
        assert_ne!(a, b);

        // Same skeleton but offsets shifted differently
        let c = key("=A2-B2", 4, 3);
        assert_ne!(a, c);
    }

    #[test]
    fn test_absolute_axes_by_value() {
        // $A$1 stays literal wherever the host sits
        let a = key("=$A$1*C2", 3, 2);
        let b = key("=$A$1*C5", 3, 5);
        assert_eq!(a, b);

        match &a.refs[0] {
            RefDescriptor::Cell { col, row, .. } => {
                assert_eq!(*col, AxisKey::Abs(1));
                assert_eq!(*row, AxisKey::Abs(1));
            }
            other => panic!("expected cell descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_offsets() {
        let k = key("=B5", 3, 2); // host C2, target B5
        match &k.refs[0] {
            RefDescriptor::Cell { col, row, .. } => {
                assert_eq!(*col, AxisKey::Rel(-1));
                assert_eq!(*row, AxisKey::Rel(3));
            }
            other => panic!("expected cell descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_cross_sheet_tagged() {
        let local = key("=B2", 1, 1);
        let cross = key("=Data!B2", 1, 1);
        assert_ne!(local.refs, cross.refs);
        match &cross.refs[0] {
            RefDescriptor::Cell { sheet, .. } => assert_eq!(sheet.as_deref(), Some("Data")),
            other => panic!("expected cell descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_external_tagged() {
        let k = key("=[Book.xlsx]Sheet1!A1", 1, 1);
        match &k.refs[0] {
            RefDescriptor::Cell { external, sheet, .. } => {
                assert_eq!(external.as_deref(), Some("Book.xlsx"));
                assert_eq!(sheet.as_deref(), Some("Sheet1"));
            }
            other => panic!("expected cell descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_range_descriptor() {
        // SUM over a window dragged down: same key
        let a = key("=SUM(A1:A4)", 2, 5);
        let b = key("=SUM(A2:A5)", 2, 6);
        assert_eq!(a, b);
        assert_eq!(a.skeleton, "SUM(@0)");
    }

    #[test]
    fn test_table_descriptor_literal() {
        let a = key("=SUM(Sales[Amount])", 2, 2);
        let b = key("=SUM(Sales[Amount])", 2, 9);
        assert_eq!(a, b);
        match &a.refs[0] {
            RefDescriptor::Table { table, column } => {
                assert_eq!(table, "Sales");
                assert_eq!(column, "Amount");
            }
            other => panic!("expected table descriptor, got {:?}", other),
        }
    }
}
