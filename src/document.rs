//! In-memory template documents and the text-unit seam.
//!
//! A document is an ordered list of blocks: free paragraphs and tables of
//! rows, cells and cell paragraphs. Conversion never edits whole documents;
//! it walks the ordered text units (paragraphs first, then every table cell
//! paragraph) and rewrites them one at a time.
//!
//! On disk a template is plain text: each line is a paragraph, and a run of
//! lines starting with `|` forms a table, one row per line with `|`-separated
//! cells. `.html`/`.htm` files can be imported; they are read through an
//! HTML-to-text pass and always save back as plain text.

use log::debug;
use std::fmt;
use std::fs;
use std::path::Path;

/// Errors raised while loading or saving a template document.
#[derive(Debug)]
pub enum DocumentError {
    Read(String),
    Parse(String),
    Write(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocumentError::Read(details) => {
                write!(f, "Failed to read document: {}", details)
            }
            DocumentError::Parse(details) => {
                write!(f, "Failed to parse document: {}", details)
            }
            DocumentError::Write(details) => {
                write!(f, "Failed to write document: {}", details)
            }
        }
    }
}

impl std::error::Error for DocumentError {}

/// Ordered, index-addressed access to a document's text units.
///
/// Unit order is fixed: every free paragraph in document order, then every
/// table cell paragraph (tables in document order, rows top to bottom, cells
/// left to right). Indices stay stable while unit texts are rewritten.
pub trait TextTree {
    /// Number of text units.
    fn unit_count(&self) -> usize;

    /// Text of the unit at `index`, or `None` when out of range.
    fn unit_text(&self, index: usize) -> Option<&str>;

    /// Replaces the text of the unit at `index`. Returns false when out of
    /// range.
    fn set_unit_text(&mut self, index: usize, text: String) -> bool;

    /// Every unit joined with newlines, in unit order. This is the text the
    /// scanner and validator operate on.
    fn full_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.unit_count());
        for index in 0..self.unit_count() {
            if let Some(text) = self.unit_text(index) {
                parts.push(text.to_string());
            }
        }
        parts.join("\n")
    }
}

/// One block of a template document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub paragraphs: Vec<String>,
}

/// An in-memory template document.
#[derive(Debug, Clone, Default)]
pub struct TemplateDocument {
    pub blocks: Vec<Block>,
}

impl TemplateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the plain-text template format. Never fails: any line is a
    /// valid paragraph, and any `|` line is a valid table row.
    pub fn from_text(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut open_table: Option<Table> = None;

        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim_start().starts_with('|') {
                open_table
                    .get_or_insert_with(Table::default)
                    .rows
                    .push(parse_row(line));
            } else {
                if let Some(table) = open_table.take() {
                    blocks.push(Block::Table(table));
                }
                blocks.push(Block::Paragraph(line.to_string()));
            }
        }
        if let Some(table) = open_table.take() {
            blocks.push(Block::Table(table));
        }

        TemplateDocument { blocks }
    }

    /// Imports an HTML fragment or page as a paragraphs-only document.
    pub fn from_html(html: &str) -> Result<Self, DocumentError> {
        let text = html2text::from_read(html.as_bytes(), HTML_RENDER_WIDTH)
            .map_err(|e| DocumentError::Parse(format!("HTML conversion failed: {}", e)))?;
        Ok(Self::from_text(&text))
    }

    /// Loads a template from disk, importing `.html`/`.htm` files through the
    /// HTML-to-text pass.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| DocumentError::Read(format!("{}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let doc = if extension == "html" || extension == "htm" {
            Self::from_html(&raw)?
        } else {
            Self::from_text(&raw)
        };

        debug!(
            "Loaded {} ({} text unit(s))",
            path.display(),
            doc.unit_count()
        );
        Ok(doc)
    }

    /// Renders the document back to the plain-text template format, in
    /// document order. Cells holding several paragraphs are flattened with
    /// spaces so the row stays on one line.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => lines.push(text.clone()),
                Block::Table(table) => {
                    for row in &table.rows {
                        let cells: Vec<String> =
                            row.cells.iter().map(|c| c.paragraphs.join(" ")).collect();
                        lines.push(format!("| {} |", cells.join(" | ")));
                    }
                }
            }
        }
        lines.join("\n")
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let mut content = self.to_text();
        content.push('\n');
        fs::write(path, content)
            .map_err(|e| DocumentError::Write(format!("{}: {}", path.display(), e)))
    }
}

const HTML_RENDER_WIDTH: usize = 10_000;

fn parse_row(line: &str) -> Row {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let cells = inner
        .split('|')
        .map(|cell| Cell {
            paragraphs: vec![cell.trim().to_string()],
        })
        .collect();
    Row { cells }
}

impl TextTree for TemplateDocument {
    fn unit_count(&self) -> usize {
        let mut count = 0;
        for block in &self.blocks {
            match block {
                Block::Paragraph(_) => count += 1,
                Block::Table(table) => {
                    for row in &table.rows {
                        for cell in &row.cells {
                            count += cell.paragraphs.len();
                        }
                    }
                }
            }
        }
        count
    }

    fn unit_text(&self, index: usize) -> Option<&str> {
        let mut remaining = index;
        for block in &self.blocks {
            if let Block::Paragraph(text) = block {
                if remaining == 0 {
                    return Some(text.as_str());
                }
                remaining -= 1;
            }
        }
        for block in &self.blocks {
            if let Block::Table(table) = block {
                for row in &table.rows {
                    for cell in &row.cells {
                        for paragraph in &cell.paragraphs {
                            if remaining == 0 {
                                return Some(paragraph.as_str());
                            }
                            remaining -= 1;
                        }
                    }
                }
            }
        }
        None
    }

    fn set_unit_text(&mut self, index: usize, text: String) -> bool {
        let mut remaining = index;
        for block in &mut self.blocks {
            if let Block::Paragraph(existing) = block {
                if remaining == 0 {
                    *existing = text;
                    return true;
                }
                remaining -= 1;
            }
        }
        for block in &mut self.blocks {
            if let Block::Table(table) = block {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        for paragraph in &mut cell.paragraphs {
                            if remaining == 0 {
                                *paragraph = text;
                                return true;
                            }
                            remaining -= 1;
                        }
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stencil_doc_{}_{}", std::process::id(), name))
    }

    #[test]
    fn parses_paragraphs_and_table_runs() {
        let doc = TemplateDocument::from_text("Lease Agreement\n| Tenant | [NAME] |\n| Rent | ____ |\nSigned");
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks[0], Block::Paragraph("Lease Agreement".to_string()));
        match &doc.blocks[1] {
            Block::Table(table) => {
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[0].cells[1].paragraphs, vec!["[NAME]".to_string()]);
            }
            other => panic!("expected a table, got {:?}", other),
        }
        assert_eq!(doc.blocks[2], Block::Paragraph("Signed".to_string()));
    }

    #[test]
    fn unit_order_is_paragraphs_then_cells() {
        let doc = TemplateDocument::from_text("first\n| a | b |\nlast");
        assert_eq!(doc.unit_count(), 4);
        assert_eq!(doc.unit_text(0), Some("first"));
        assert_eq!(doc.unit_text(1), Some("last"));
        assert_eq!(doc.unit_text(2), Some("a"));
        assert_eq!(doc.unit_text(3), Some("b"));
        assert_eq!(doc.unit_text(4), None);
        assert_eq!(doc.full_text(), "first\nlast\na\nb");
    }

    #[test]
    fn set_unit_text_rewrites_in_place() {
        let mut doc = TemplateDocument::from_text("para\n| cell |");
        assert!(doc.set_unit_text(0, "PARA".to_string()));
        assert!(doc.set_unit_text(1, "CELL".to_string()));
        assert!(!doc.set_unit_text(2, "nope".to_string()));
        assert_eq!(doc.full_text(), "PARA\nCELL");
    }

    #[test]
    fn text_format_round_trips() {
        let source = "Lease Agreement\n| Tenant | [NAME] |\n| Rent | ____ |\nSigned";
        let doc = TemplateDocument::from_text(source);
        assert_eq!(doc.to_text(), source);
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("roundtrip.txt");
        let doc = TemplateDocument::from_text("Hello [NAME]\n| due | ${AMOUNT} |");
        doc.save(&path).unwrap();

        let loaded = TemplateDocument::load(&path).unwrap();
        assert_eq!(loaded.full_text(), doc.full_text());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let result = TemplateDocument::load(Path::new("/definitely/not/here.txt"));
        match result {
            Err(DocumentError::Read(details)) => assert!(details.contains("not/here.txt")),
            other => panic!("expected a read error, got {:?}", other.map(|d| d.blocks.len())),
        }
    }

    #[test]
    fn html_import_yields_paragraphs_only() {
        let doc =
            TemplateDocument::from_html("<html><body><p>Tenant: [TENANT NAME]</p><p>Rent due</p></body></html>")
                .unwrap();
        assert!(doc.blocks.iter().all(|b| matches!(b, Block::Paragraph(_))));
        assert!(doc.full_text().contains("[TENANT NAME]"));
    }

    #[test]
    fn crlf_input_is_normalised() {
        let doc = TemplateDocument::from_text("one\r\n| a |\r\ntwo");
        assert_eq!(doc.unit_text(0), Some("one"));
        assert_eq!(doc.unit_text(1), Some("two"));
        assert_eq!(doc.unit_text(2), Some("a"));
    }
}
