//! Image document reader.

use std::path::Path;

use corpora_core::Document;

use super::DocumentReader;
use crate::{Error, Result};

/// Reads raster image files into one image document per file.
///
/// The image is not decoded here; only its header is inspected to verify
/// the file is a readable image and to record its dimensions. Embedding
/// backends consume the file path directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageReader;

impl ImageReader {
    /// Creates a new image reader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for ImageReader {
    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "gif", "webp", "bmp"]
    }

    fn read(&self, path: &Path) -> Result<Vec<Document>> {
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| Error::read(path.display(), e.to_string()))?;

        let document = Document::image(path)
            .with_source(path)
            .with_field("width", serde_json::json!(width))
            .with_field("height", serde_json::json!(height));

        Ok(vec![document])
    }
}
