//! Cell records: content classification and formatting snapshots
//!
//! A [`CellRecord`] is produced once per workbook scan by the external
//! loader and never mutated afterwards. The engine only ever reads it.

use crate::address::CellCoord;

/// What kind of content a cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentKind {
    /// Text starting with `=`
    Formula,
    /// A numeric literal
    HardcodedNumber,
    /// Any other non-empty text
    Label,
    /// No content
    Empty,
}

impl ContentKind {
    /// Classify raw cell content
    pub fn classify(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            ContentKind::Empty
        } else if trimmed.starts_with('=') {
            ContentKind::Formula
        } else if trimmed.parse::<f64>().is_ok() {
            ContentKind::HardcodedNumber
        } else {
            ContentKind::Label
        }
    }
}

/// Font snapshot as captured by the loader
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontSnapshot {
    pub bold: bool,
    pub italic: bool,
    pub size: Option<f64>,
    /// ARGB color string, e.g. "FF0000FF"
    pub color: Option<String>,
}

/// Alignment snapshot as captured by the loader
///
/// The horizontal/vertical values are kept as the loader's own strings
/// ("center", "right", ...) since the engine never interprets them.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentSnapshot {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
}

/// Formatting snapshot for one cell
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatSnapshot {
    /// Number format code ("General" is normalized to `None`)
    pub number_format: Option<String>,
    pub font: Option<FontSnapshot>,
    /// Solid fill ARGB color
    pub fill_color: Option<String>,
    pub alignment: Option<AlignmentSnapshot>,
}

impl FormatSnapshot {
    /// True when nothing deviates from workbook defaults
    pub fn is_default(&self) -> bool {
        self.number_format.is_none()
            && self.font.is_none()
            && self.fill_color.is_none()
            && self.alignment.is_none()
    }
}

/// One cell as captured from the workbook
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRecord {
    /// Position within the owning sheet
    pub coord: CellCoord,
    /// Raw content: formula text (with leading `=`), literal text, or ""
    pub content: String,
    /// Classification of `content`
    pub kind: ContentKind,
    /// Formatting as captured
    pub format: FormatSnapshot,
}

impl CellRecord {
    /// Create a record, classifying its content
    pub fn new(coord: CellCoord, content: impl Into<String>) -> Self {
        let content = content.into();
        let kind = ContentKind::classify(&content);
        Self {
            coord,
            content,
            kind,
            format: FormatSnapshot::default(),
        }
    }

    /// Create a record with a formatting snapshot
    pub fn with_format(coord: CellCoord, content: impl Into<String>, format: FormatSnapshot) -> Self {
        let mut record = Self::new(coord, content);
        record.format = format;
        record
    }

    /// The formula text, if this cell holds one
    pub fn formula(&self) -> Option<&str> {
        match self.kind {
            ContentKind::Formula => Some(&self.content),
            _ => None,
        }
    }

    /// True for formula cells
    pub fn is_formula(&self) -> bool {
        self.kind == ContentKind::Formula
    }

    /// True for hardcoded numeric inputs
    pub fn is_hardcoded_number(&self) -> bool {
        self.kind == ContentKind::HardcodedNumber
    }
}
