//! Document and modality types.
//!
//! A [`Document`] is the normalized record produced by a reader from one
//! input file. It is immutable once produced and consumed by the index
//! builder, which may split, embed, and store it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use uuid::Uuid;

/// The data type an index or tool operates on.
///
/// Collections are scoped per modality to prevent cross-modal retrieval
/// contamination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Modality {
    /// Natural-language text.
    Text,
    /// Raster images.
    Image,
}

/// Document payload, by modality.
///
/// Image content is carried as a path rather than decoded pixels: the image
/// embedding backends consume files directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentContent {
    /// Extracted text. Page breaks are indicated by form feed characters.
    Text(String),
    /// Path to an image file on disk.
    ImagePath(PathBuf),
}

/// A normalized document record: content plus metadata.
///
/// Created by a reader from one input file; immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for this document.
    pub id: Uuid,

    /// The document content.
    pub content: DocumentContent,

    /// Metadata as key-value pairs (source path, page count, dimensions).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Creates a text document.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: DocumentContent::Text(content.into()),
            metadata: HashMap::new(),
        }
    }

    /// Creates an image document referencing a file on disk.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: DocumentContent::ImagePath(path.into()),
            metadata: HashMap::new(),
        }
    }

    /// Adds a metadata field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Records the source path in metadata.
    pub fn with_source(self, path: &Path) -> Self {
        self.with_field("source", serde_json::json!(path.display().to_string()))
    }

    /// Returns the modality of this document.
    pub fn modality(&self) -> Modality {
        match &self.content {
            DocumentContent::Text(_) => Modality::Text,
            DocumentContent::ImagePath(_) => Modality::Image,
        }
    }

    /// Returns the text content, if this is a text document.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            DocumentContent::Text(text) => Some(text),
            DocumentContent::ImagePath(_) => None,
        }
    }

    /// Returns the image path, if this is an image document.
    pub fn as_image_path(&self) -> Option<&Path> {
        match &self.content {
            DocumentContent::Text(_) => None,
            DocumentContent::ImagePath(path) => Some(path),
        }
    }

    /// Returns the recorded source path, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document(id={}, modality={}", self.id, self.modality().as_ref())?;
        if let Some(source) = self.source() {
            write!(f, ", source={source}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_document_modality() {
        let doc = Document::text("hello");
        assert_eq!(doc.modality(), Modality::Text);
        assert_eq!(doc.as_text(), Some("hello"));
        assert!(doc.as_image_path().is_none());
    }

    #[test]
    fn image_document_modality() {
        let doc = Document::image("/data/image-1.png");
        assert_eq!(doc.modality(), Modality::Image);
        assert!(doc.as_text().is_none());
    }

    #[test]
    fn source_metadata_round_trip() {
        let doc = Document::text("hello").with_source(Path::new("/data/report.pdf"));
        assert_eq!(doc.source(), Some("/data/report.pdf"));
    }

    #[test]
    fn modality_serializes_snake_case() {
        assert_eq!(Modality::Image.as_ref(), "image");
        let json = serde_json::to_string(&Modality::Text).unwrap();
        assert_eq!(json, "\"text\"");
    }
}
