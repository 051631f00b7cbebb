//! PDF document reader.

use std::path::Path;

use corpora_core::Document;

use super::DocumentReader;
use crate::{Error, Result};

/// Reads PDF files into one text document per file.
///
/// Extracted text keeps form feed characters (`\x0c`) as page breaks so
/// downstream chunking can attribute chunks to pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl PdfReader {
    /// Creates a new PDF reader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for PdfReader {
    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn read(&self, path: &Path) -> Result<Vec<Document>> {
        let text = pdf_extract::extract_text(path)
            .map_err(|e| Error::read(path.display(), e.to_string()))?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pages = text.matches('\x0c').count() + 1;
        let document = Document::text(text)
            .with_source(path)
            .with_field("pages", serde_json::json!(pages));

        Ok(vec![document])
    }
}
