//! In-memory document loaded from plain text or JSON

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::errors::{Result, TranslationError};
use crate::document::{CellAddress, CellSnapshot, DocumentHost, FontAttributes, ParagraphSnapshot};

/// One paragraph with its character formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub font: FontAttributes,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: FontAttributes::default(),
        }
    }

    pub fn with_font(mut self, font: FontAttributes) -> Self {
        self.font = font;
        self
    }
}

/// Table as rows of cell texts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// A document whose selection is its entire content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Document {
    /// One paragraph per line
    pub fn from_plain_text(text: &str) -> Self {
        Self {
            paragraphs: text.lines().map(Paragraph::new).collect(),
            tables: Vec::new(),
        }
    }

    /// Load `.json` as the full model, anything else as plain text
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TranslationError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let document = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            Self::from_plain_text(&content)
        };

        debug!(
            "Loaded {}: {} paragraphs, {} tables",
            path.display(),
            document.paragraphs.len(),
            document.tables.len()
        );
        Ok(document)
    }

    /// Save in the format implied by the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            self.to_plain_text()
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| TranslationError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Paragraphs one per line, then each table row tab-separated
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = self.paragraphs.iter().map(|p| p.text.clone()).collect();
        for table in &self.tables {
            lines.extend(table.rows.iter().map(|row| row.join("\t")));
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn cell_mut(&mut self, address: CellAddress) -> Result<&mut String> {
        self.tables
            .get_mut(address.table)
            .and_then(|t| t.rows.get_mut(address.row))
            .and_then(|r| r.get_mut(address.cell))
            .ok_or_else(|| TranslationError::DocumentError {
                message: format!(
                    "no cell at table {} row {} cell {}",
                    address.table, address.row, address.cell
                ),
            })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

impl DocumentHost for Document {
    fn selection_text(&self) -> Result<String> {
        Ok(self
            .paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// New paragraphs inherit the formatting of the first replaced one
    fn replace_selection(&mut self, text: &str) -> Result<()> {
        let font = self
            .paragraphs
            .first()
            .map(|p| p.font.clone())
            .unwrap_or_default();
        self.paragraphs = text
            .lines()
            .map(|line| Paragraph::new(line).with_font(font.clone()))
            .collect();
        Ok(())
    }

    fn paragraphs(&self) -> Result<Vec<ParagraphSnapshot>> {
        Ok(self
            .paragraphs
            .iter()
            .enumerate()
            .map(|(index, p)| ParagraphSnapshot {
                index,
                text: p.text.clone(),
                font: p.font.clone(),
            })
            .collect())
    }

    fn replace_paragraph(
        &mut self,
        index: usize,
        text: &str,
        font: Option<&FontAttributes>,
    ) -> Result<()> {
        let paragraph = self
            .paragraphs
            .get_mut(index)
            .ok_or_else(|| TranslationError::DocumentError {
                message: format!("no paragraph at index {}", index),
            })?;
        paragraph.text = text.to_string();
        if let Some(font) = font {
            paragraph.font = font.clone();
        }
        Ok(())
    }

    fn table_cells(&self) -> Result<Vec<CellSnapshot>> {
        let mut cells = Vec::new();
        for (t, table) in self.tables.iter().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, text) in row.iter().enumerate() {
                    cells.push(CellSnapshot {
                        address: CellAddress {
                            table: t,
                            row: r,
                            cell: c,
                        },
                        text: text.clone(),
                    });
                }
            }
        }
        Ok(cells)
    }

    fn replace_cell(&mut self, address: CellAddress, text: &str) -> Result<()> {
        let cell = self.cell_mut(address)?;
        cell.clear();
        cell.push_str(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_paragraphs() {
        let doc = Document::from_plain_text("First line\n\nThird line");
        assert_eq!(doc.paragraphs.len(), 3);
        assert_eq!(doc.selection_text().unwrap(), "First line\n\nThird line");
    }

    #[test]
    fn test_replace_selection_keeps_first_font() {
        let bold = FontAttributes {
            bold: Some(true),
            ..Default::default()
        };
        let mut doc = Document {
            paragraphs: vec![Paragraph::new("a").with_font(bold.clone()), Paragraph::new("b")],
            tables: vec![],
        };
        doc.replace_selection("x\ny\nz").unwrap();
        assert_eq!(doc.paragraphs.len(), 3);
        assert!(doc.paragraphs.iter().all(|p| p.font == bold));
    }

    #[test]
    fn test_cell_addressing() {
        let mut doc = Document {
            paragraphs: vec![],
            tables: vec![Table {
                rows: vec![vec!["a".into(), "b".into()], vec!["c".into(), "".into()]],
            }],
        };
        let cells = doc.table_cells().unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[2].address, CellAddress { table: 0, row: 1, cell: 0 });

        doc.replace_cell(cells[2].address, "C").unwrap();
        assert_eq!(doc.tables[0].rows[1][0], "C");
        assert!(doc
            .replace_cell(CellAddress { table: 3, row: 0, cell: 0 }, "x")
            .is_err());
    }

    #[test]
    fn test_json_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(
            &path,
            r#"{"paragraphs":[{"text":"Hi","font":{"name":"Calibri","size":11.0,"italic":true}}],"tables":[{"rows":[["x"]]}]}"#,
        )
        .unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.paragraphs[0].font.name.as_deref(), Some("Calibri"));
        assert_eq!(doc.paragraphs[0].font.italic, Some(true));
        assert_eq!(doc.tables[0].rows[0][0], "x");

        let out = dir.path().join("out.txt");
        doc.save(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Hi\nx\n");
    }
}
