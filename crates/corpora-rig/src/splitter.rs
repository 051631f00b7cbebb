//! Text chunking for index construction.

use text_splitter::{ChunkConfig, TextSplitter};

use crate::{Error, Result};

/// Chunking configuration for text documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters of overlap between adjacent chunks.
    pub overlap: usize,
}

impl SplitterConfig {
    /// Creates a new splitter configuration.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Splits text into trimmed chunks, tracking the page each chunk
    /// starts on. Page breaks are form feed characters (`\x0c`).
    pub fn split(&self, text: &str) -> Result<Vec<TextChunk>> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.overlap)
            .map_err(|e| Error::config(e.to_string()))?
            .with_trim(true);
        let splitter = TextSplitter::new(config);

        let page_breaks: Vec<usize> = text
            .char_indices()
            .filter(|(_, c)| *c == '\x0c')
            .map(|(i, _)| i)
            .collect();

        let chunks = splitter
            .chunk_indices(text)
            .map(|(offset, chunk)| {
                let page = page_breaks.iter().take_while(|&&pos| pos < offset).count() + 1;
                TextChunk {
                    text: chunk.to_string(),
                    page,
                }
            })
            .collect();

        Ok(chunks)
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::new(512, 20)
    }
}

/// A single text chunk with its originating page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk text.
    pub text: String,
    /// 1-based page the chunk starts on.
    pub page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_chunk_size() {
        let config = SplitterConfig::new(50, 0);
        let chunks = config
            .split("Hello world. This is a test. Another sentence here.")
            .unwrap();

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.len() <= 50);
        }
    }

    #[test]
    fn split_tracks_pages() {
        let config = SplitterConfig::new(20, 0);
        let chunks = config
            .split("Page one content.\x0cPage two content.\x0cPage three.")
            .unwrap();

        assert!(chunks.len() >= 3);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks.last().unwrap().page, 3);
    }

    #[test]
    fn split_rejects_overlap_at_least_chunk_size() {
        let config = SplitterConfig::new(10, 10);
        assert!(config.split("some text").is_err());
    }

    #[test]
    fn split_empty_text_is_empty() {
        let config = SplitterConfig::default();
        assert!(config.split("").unwrap().is_empty());
    }
}
