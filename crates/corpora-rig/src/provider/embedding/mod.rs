//! Embedding providers, one modality each.
//!
//! An [`Embedder`] maps documents of a single modality to fixed-dimension
//! vectors and maps text queries into the same space. Image embedders use
//! a dual-tower model so a text query can retrieve images.

mod local;
mod openai;

pub use local::{ClipEmbedder, MiniLmEmbedder};
pub use openai::OpenAiEmbedder;

use async_trait::async_trait;
use corpora_core::{Document, Modality};

use crate::Result;

/// Embeds documents of one modality into a fixed-dimension vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The modality of documents this embedder accepts.
    fn modality(&self) -> Modality;

    /// Output vector dimension. Every returned vector has this length.
    fn ndims(&self) -> usize;

    /// Embeds a batch of documents, one vector per document, in order.
    async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>>;

    /// Embeds a text query into the same space as the documents.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Deterministic embedder for tests: hashes text into a small vector.
    pub struct StubEmbedder {
        pub modality: Modality,
        pub ndims: usize,
    }

    impl StubEmbedder {
        pub fn text(ndims: usize) -> Self {
            Self {
                modality: Modality::Text,
                ndims,
            }
        }

        fn embed_str(&self, input: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; self.ndims];
            for (i, byte) in input.bytes().enumerate() {
                vector[i % self.ndims] += byte as f32 / 255.0;
            }
            vector
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn modality(&self) -> Modality {
            self.modality
        }

        fn ndims(&self) -> usize {
            self.ndims
        }

        async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
            Ok(documents
                .iter()
                .map(|d| self.embed_str(d.as_text().unwrap_or_default()))
                .collect())
        }

        async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
            Ok(self.embed_str(query))
        }
    }

    #[tokio::test]
    async fn stub_embedder_dimension_invariant() {
        let embedder = StubEmbedder::text(8);
        let documents = vec![
            corpora_core::Document::text("first"),
            corpora_core::Document::text("a much longer second document"),
        ];

        let vectors = embedder.embed_documents(&documents).await.unwrap();
        assert_eq!(vectors.len(), 2);
        for vector in &vectors {
            assert_eq!(vector.len(), embedder.ndims());
        }

        let query = embedder.embed_query("first").await.unwrap();
        assert_eq!(query.len(), embedder.ndims());
    }
}
