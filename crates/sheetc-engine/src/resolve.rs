//! Reference resolver
//!
//! Extracts every cell, range, table and external reference from a formula
//! in one forward scan, with absolute/relative markers and source spans.
//!
//! At each position the matchers run in priority order so no text span is
//! claimed twice: external range/cell, then internal cross-sheet range/cell
//! (quoted or bare sheet name), then structured table references, then
//! same-sheet range/cell. Text inside double-quoted string literals is
//! never matched (`""` is an escaped quote, not a terminator), and a
//! cell-like candidate immediately preceded by an identifier character is
//! rejected as part of a longer name. Malformed reference-like text simply
//! stays unmatched.

use sheetc_core::{letters_to_column, CellAddress, CellCoord};

/// Reference category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefKind {
    Cell,
    Range,
    Table,
}

/// One corner of a cell or range reference, with absolute markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefCoord {
    /// Column index (1-based)
    pub col: u32,
    /// Row index (1-based)
    pub row: u32,
    /// `$A` marker
    pub col_abs: bool,
    /// `$1` marker
    pub row_abs: bool,
}

impl RefCoord {
    /// The position without absolute markers
    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.col, self.row)
    }
}

/// What a reference points at
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefTarget {
    /// Single cell
    Cell(RefCoord),
    /// Rectangular range (start, end as written)
    Range(RefCoord, RefCoord),
    /// Structured table column; the specifier is kept verbatim
    Table { table: String, column: String },
}

/// A reference extracted from a formula
///
/// Equality is positional (all fields), never object identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    pub target: RefTarget,
    /// Resolved sheet name; the current sheet when the reference was
    /// unqualified. For table references this is the host sheet until the
    /// translator resolves it against table metadata.
    pub sheet: String,
    /// External workbook file tag (`[Book.xlsx]Sheet!A1`)
    pub external_file: Option<String>,
    /// Start byte offset within the formula body (after any leading `=`)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// The matched text, verbatim
    pub raw: String,
}

impl Reference {
    pub fn kind(&self) -> RefKind {
        match self.target {
            RefTarget::Cell(_) => RefKind::Cell,
            RefTarget::Range(_, _) => RefKind::Range,
            RefTarget::Table { .. } => RefKind::Table,
        }
    }

    /// True when the reference leaves the given sheet
    pub fn is_cross_sheet(&self, current_sheet: &str) -> bool {
        self.external_file.is_some() || self.sheet != current_sheet
    }

    /// Address of a single-cell reference in this workbook
    ///
    /// `None` for ranges, tables and external references.
    pub fn cell_address(&self) -> Option<CellAddress> {
        if self.external_file.is_some() {
            return None;
        }
        match &self.target {
            RefTarget::Cell(c) => Some(CellAddress::new(&*self.sheet, c.col, c.row)),
            _ => None,
        }
    }
}

/// Extract every reference from a formula, sorted by source offset
///
/// Deterministic across repeated calls on identical input: the output
/// order is the scan order. A leading `=` is stripped before scanning;
/// spans are relative to the remaining body.
pub fn extract_references(formula: &str, current_sheet: &str) -> Vec<Reference> {
    let body = formula.strip_prefix('=').unwrap_or(formula);
    let bytes = body.as_bytes();

    let mut refs = Vec::new();
    let mut in_str = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'"' {
            if in_str {
                // Escaped "" stays inside the literal
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                in_str = false;
            } else {
                in_str = true;
            }
            i += 1;
            continue;
        }
        if in_str {
            i += 1;
            continue;
        }

        // A match cannot start in the middle of an identifier
        if i > 0 && is_ident_byte(bytes[i - 1]) {
            i += 1;
            continue;
        }

        let matched = match_external(body, i, current_sheet)
            .or_else(|| match_cross_sheet(body, i))
            .or_else(|| match_table(body, i, current_sheet))
            .or_else(|| match_local(body, i, current_sheet));

        match matched {
            Some((reference, end)) => {
                refs.push(reference);
                i = end;
            }
            None => i += 1,
        }
    }

    refs
}

fn is_ident_byte(b: u8) -> bool {
    // Non-ASCII bytes are treated as identifier characters so a match
    // never starts inside a multi-byte name.
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'.' || b >= 0x80
}

/// Parse `$?letters{1,3}$?digits{1,7}` at `i`
fn parse_coord(body: &str, i: usize) -> Option<(RefCoord, usize)> {
    let bytes = body.as_bytes();
    let mut j = i;

    let col_abs = bytes.get(j) == Some(&b'$');
    if col_abs {
        j += 1;
    }

    let letters_start = j;
    while j < bytes.len() && bytes[j].is_ascii_alphabetic() && j - letters_start < 3 {
        j += 1;
    }
    if j == letters_start {
        return None;
    }
    // A fourth letter means this is a longer name, not a column
    if j < bytes.len() && bytes[j].is_ascii_alphabetic() {
        return None;
    }
    let col = letters_to_column(&body[letters_start..j]).ok()?;

    let row_abs = bytes.get(j) == Some(&b'$');
    if row_abs {
        j += 1;
    }

    let digits_start = j;
    while j < bytes.len() && bytes[j].is_ascii_digit() && j - digits_start < 7 {
        j += 1;
    }
    if j == digits_start || (j < bytes.len() && bytes[j].is_ascii_digit()) {
        return None;
    }
    let row: u32 = body[digits_start..j].parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((
        RefCoord {
            col,
            row,
            col_abs,
            row_abs,
        },
        j,
    ))
}

/// Parse a cell or `cell:cell` range starting at `i`
fn parse_target(body: &str, i: usize) -> Option<(RefTarget, usize)> {
    let (start, j) = parse_coord(body, i)?;
    if body.as_bytes().get(j) == Some(&b':') {
        if let Some((end, k)) = parse_coord(body, j + 1) {
            return Some((RefTarget::Range(start, end), k));
        }
    }
    // A cell-like token directly followed by `(` is a function name
    if body.as_bytes().get(j) == Some(&b'(') {
        return None;
    }
    Some((RefTarget::Cell(start), j))
}

/// `[Book.xlsx]Sheet!A1` or `'[Book.xlsx]Sheet Name'!A1:B2`
fn match_external(body: &str, i: usize, _current_sheet: &str) -> Option<(Reference, usize)> {
    let bytes = body.as_bytes();
    let mut j = i;

    let quoted = bytes.get(j) == Some(&b'\'');
    if quoted {
        j += 1;
    }
    if bytes.get(j) != Some(&b'[') {
        return None;
    }
    j += 1;

    let file_start = j;
    while j < bytes.len() && bytes[j] != b']' {
        j += 1;
    }
    if j >= bytes.len() || j == file_start {
        return None;
    }
    let file = &body[file_start..j];
    j += 1; // past ']'

    let sheet_start = j;
    while j < bytes.len() && !matches!(bytes[j], b'!' | b'\'' | b'[' | b']') {
        j += 1;
    }
    if j == sheet_start {
        return None;
    }
    let sheet = &body[sheet_start..j];

    if quoted {
        if bytes.get(j) != Some(&b'\'') {
            return None;
        }
        j += 1;
    }
    if bytes.get(j) != Some(&b'!') {
        return None;
    }
    j += 1;

    let (target, end) = parse_target(body, j)?;
    Some((
        Reference {
            target,
            sheet: sheet.to_string(),
            external_file: Some(file.to_string()),
            start: i,
            end,
            raw: body[i..end].to_string(),
        },
        end,
    ))
}

/// `Sheet1!A1`, `'Sheet Name'!A1:B2`
fn match_cross_sheet(body: &str, i: usize) -> Option<(Reference, usize)> {
    let bytes = body.as_bytes();
    let (sheet, after_bang) = if bytes.get(i) == Some(&b'\'') {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j] != b'\'' {
            j += 1;
        }
        if j >= bytes.len() || j == i + 1 {
            return None;
        }
        let name = &body[i + 1..j];
        if name.contains('[') || name.contains(']') {
            return None;
        }
        if bytes.get(j + 1) != Some(&b'!') {
            return None;
        }
        (name, j + 2)
    } else {
        if !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
            return None;
        }
        let mut j = i + 1;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if bytes.get(j) != Some(&b'!') {
            return None;
        }
        (&body[i..j], j + 1)
    };

    let (target, end) = parse_target(body, after_bang)?;
    Some((
        Reference {
            target,
            sheet: sheet.to_string(),
            external_file: None,
            start: i,
            end,
            raw: body[i..end].to_string(),
        },
        end,
    ))
}

/// `Name[Column]` or `Name[[#Headers],[Column]]`
fn match_table(body: &str, i: usize, current_sheet: &str) -> Option<(Reference, usize)> {
    let bytes = body.as_bytes();
    if !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        return None;
    }
    let mut j = i + 1;
    while j < bytes.len()
        && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || bytes[j] == b'.')
    {
        j += 1;
    }
    if bytes.get(j) != Some(&b'[') {
        return None;
    }
    let name = &body[i..j];

    let mut depth = 0usize;
    let mut k = j;
    while k < bytes.len() {
        match bytes[k] {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        k += 1;
    }
    if k >= bytes.len() {
        return None;
    }
    let column = &body[j + 1..k];
    let end = k + 1;

    Some((
        Reference {
            target: RefTarget::Table {
                table: name.to_string(),
                column: column.to_string(),
            },
            sheet: current_sheet.to_string(),
            external_file: None,
            start: i,
            end,
            raw: body[i..end].to_string(),
        },
        end,
    ))
}

/// `A1`, `$A$1`, `A1:B10` on the current sheet
fn match_local(body: &str, i: usize, current_sheet: &str) -> Option<(Reference, usize)> {
    let (target, end) = parse_target(body, i)?;
    Some((
        Reference {
            target,
            sheet: current_sheet.to_string(),
            external_file: None,
            start: i,
            end,
            raw: body[i..end].to_string(),
        },
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refs(formula: &str) -> Vec<Reference> {
        extract_references(formula, "S")
    }

    #[test]
    fn test_local_cells() {
        let r = refs("=A1+B1");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].sheet, "S");
        assert_eq!(r[1].sheet, "S");
        assert_eq!(r[0].target, RefTarget::Cell(RefCoord {
            col: 1,
            row: 1,
            col_abs: false,
            row_abs: false,
        }));
        assert_eq!(r[0].raw, "A1");
        assert_eq!((r[0].start, r[0].end), (0, 2));
        assert_eq!(r[1].raw, "B1");
    }

    #[test]
    fn test_absolute_markers() {
        let r = refs("=$A$1+A$2+$B3");
        assert_eq!(r.len(), 3);
        let c0 = match r[0].target {
            RefTarget::Cell(c) => c,
            _ => panic!("expected cell"),
        };
        assert!(c0.col_abs && c0.row_abs);
        let c1 = match r[1].target {
            RefTarget::Cell(c) => c,
            _ => panic!("expected cell"),
        };
        assert!(!c1.col_abs && c1.row_abs);
        let c2 = match r[2].target {
            RefTarget::Cell(c) => c,
            _ => panic!("expected cell"),
        };
        assert!(c2.col_abs && !c2.row_abs);
    }

    #[test]
    fn test_range() {
        let r = refs("=SUM(C2:C6)");
        assert_eq!(r.len(), 1);
        match &r[0].target {
            RefTarget::Range(start, end) => {
                assert_eq!((start.col, start.row), (3, 2));
                assert_eq!((end.col, end.row), (3, 6));
            }
            other => panic!("expected range, got {:?}", other),
        }
        assert_eq!(r[0].raw, "C2:C6");
    }

    #[test]
    fn test_cross_sheet() {
        let r = refs("=Data!B2+'My Sheet'!C3:D4");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].sheet, "Data");
        assert_eq!(r[0].kind(), RefKind::Cell);
        assert_eq!(r[1].sheet, "My Sheet");
        assert_eq!(r[1].kind(), RefKind::Range);
    }

    #[test]
    fn test_external() {
        let r = refs("=[Book.xlsx]Sheet1!A1");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].external_file.as_deref(), Some("Book.xlsx"));
        assert_eq!(r[0].sheet, "Sheet1");
        match r[0].target {
            RefTarget::Cell(c) => assert_eq!((c.col, c.row), (1, 1)),
            _ => panic!("expected cell"),
        }
    }

    #[test]
    fn test_external_quoted_range() {
        let r = refs("='[Ext Data.xlsx]Prices 2024'!A1:B9");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].external_file.as_deref(), Some("Ext Data.xlsx"));
        assert_eq!(r[0].sheet, "Prices 2024");
        assert_eq!(r[0].kind(), RefKind::Range);
    }

    #[test]
    fn test_table_reference() {
        let r = refs("=SUM(Sales[Amount])");
        assert_eq!(r.len(), 1);
        assert_eq!(
            r[0].target,
            RefTarget::Table {
                table: "Sales".into(),
                column: "Amount".into(),
            }
        );

        let r = refs("=SUM(Sales[[#Headers],[Amount]])");
        assert_eq!(r.len(), 1);
        assert_eq!(
            r[0].target,
            RefTarget::Table {
                table: "Sales".into(),
                column: "[#Headers],[Amount]".into(),
            }
        );
    }

    #[test]
    fn test_function_name_not_a_reference() {
        // LOG10 looks like a cell reference but is a function call
        let r = refs("=LOG10(100)");
        assert!(r.is_empty());

        // SUM contains no digits and never matches
        let r = refs("=SUM(1,2)");
        assert!(r.is_empty());
    }

    #[test]
    fn test_string_literals_excluded() {
        let r = refs("=IF(A1>0,\"see B2\",C3)");
        let raws: Vec<&str> = r.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, vec!["A1", "C3"]);

        // Escaped quote does not terminate the literal
        let r = refs("=\"say \"\"A1\"\" here\"&D4");
        let raws: Vec<&str> = r.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, vec!["D4"]);
    }

    #[test]
    fn test_identifier_prefix_rejected() {
        // "1e5" is a number literal; "e5" must not become a reference
        let r = refs("=1e5+A1");
        let raws: Vec<&str> = r.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, vec!["A1"]);
    }

    #[test]
    fn test_sorted_by_offset_and_deterministic() {
        let f = "=Z9+A1*'Other'!B2";
        let a = refs(f);
        let b = refs(f);
        assert_eq!(a, b);
        let starts: Vec<usize> = a.iter().map(|r| r.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_malformed_left_alone() {
        // Unbalanced bracket, stray '!', bad row: nothing matches, nothing panics
        assert!(refs("=Tab[Col").is_empty());
        assert!(refs("=!A0").is_empty());
        assert!(refs("=XXXX123456789").is_empty());
    }

    #[test]
    fn test_same_sheet_property() {
        // No cross-sheet/table/external refs: every sheet is the current one
        for f in ["=A1+B2*C3", "=SUM(A1:A10)-MAX(B1,B2)", "=$D$4%"] {
            for r in refs(f) {
                assert_eq!(r.sheet, "S");
                assert!(r.external_file.is_none());
            }
        }
    }
}
