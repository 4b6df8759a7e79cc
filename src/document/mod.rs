//! Word-processor document abstraction

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Character formatting captured before a rewrite and reapplied after it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Underline kind as the host names it, e.g. `"Single"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A selected paragraph as read from the host
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphSnapshot {
    pub index: usize,
    pub text: String,
    pub font: FontAttributes,
}

/// Position of a table cell inside the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddress {
    pub table: usize,
    pub row: usize,
    pub cell: usize,
}

/// A selected table cell as read from the host
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    pub address: CellAddress,
    pub text: String,
}

/// Capabilities the translators need from the hosting editor.
///
/// Everything operates on the current selection.
pub trait DocumentHost: Send {
    /// Plain text of the selection
    fn selection_text(&self) -> Result<String>;

    /// Replace the whole selection with `text`
    fn replace_selection(&mut self, text: &str) -> Result<()>;

    /// Paragraphs intersecting the selection, in document order
    fn paragraphs(&self) -> Result<Vec<ParagraphSnapshot>>;

    /// Overwrite one paragraph's text, then apply `font` if given
    fn replace_paragraph(
        &mut self,
        index: usize,
        text: &str,
        font: Option<&FontAttributes>,
    ) -> Result<()>;

    /// Every table cell in the selection, table by table, row by row
    fn table_cells(&self) -> Result<Vec<CellSnapshot>>;

    /// Clear a cell and insert `text` at its start
    fn replace_cell(&mut self, address: CellAddress, text: &str) -> Result<()>;
}
