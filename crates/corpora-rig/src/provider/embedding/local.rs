//! Local embedding models backed by fastembed.
//!
//! Model weights are downloaded on first use and cached; inference runs on
//! a blocking thread so it does not stall the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use corpora_core::{Document, Modality};
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};

use super::Embedder;
use crate::{Error, Result, TRACING_TARGET};

/// all-MiniLM-L6-v2 output dimension.
const MINILM_DIMS: usize = 384;

/// CLIP ViT-B/32 output dimension, shared by both towers.
const CLIP_DIMS: usize = 512;

/// Text embedder using all-MiniLM-L6-v2.
#[derive(Clone)]
pub struct MiniLmEmbedder {
    model: Arc<TextEmbedding>,
}

impl MiniLmEmbedder {
    /// Loads the model, downloading weights on first use.
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| Error::embedding(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            model = "all-MiniLM-L6-v2",
            dimensions = MINILM_DIMS,
            "Loaded text embedding model"
        );

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for MiniLmEmbedder {
    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn ndims(&self) -> usize {
        MINILM_DIMS
    }

    async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        let texts = collect_texts(documents)?;
        embed_texts(self.model.clone(), texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let vectors = embed_texts(self.model.clone(), vec![query.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("model returned no embedding for query"))
    }
}

impl std::fmt::Debug for MiniLmEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEmbedder")
            .field("dimensions", &MINILM_DIMS)
            .finish()
    }
}

/// Image embedder using CLIP ViT-B/32.
///
/// Documents are embedded with the vision tower; queries with the text
/// tower, which shares the same vector space.
#[derive(Clone)]
pub struct ClipEmbedder {
    image_model: Arc<ImageEmbedding>,
    text_model: Arc<TextEmbedding>,
}

impl ClipEmbedder {
    /// Loads both CLIP towers, downloading weights on first use.
    pub fn new() -> Result<Self> {
        let image_model =
            ImageEmbedding::try_new(ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32))
                .map_err(|e| Error::embedding(e.to_string()))?;
        let text_model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::ClipVitB32))
            .map_err(|e| Error::embedding(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            model = "clip-ViT-B-32",
            dimensions = CLIP_DIMS,
            "Loaded image embedding model"
        );

        Ok(Self {
            image_model: Arc::new(image_model),
            text_model: Arc::new(text_model),
        })
    }
}

#[async_trait]
impl Embedder for ClipEmbedder {
    fn modality(&self) -> Modality {
        Modality::Image
    }

    fn ndims(&self) -> usize {
        CLIP_DIMS
    }

    async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        let paths: Vec<std::path::PathBuf> = documents
            .iter()
            .map(|d| {
                d.as_image_path()
                    .map(|p| p.to_path_buf())
                    .ok_or_else(|| Error::embedding(format!("expected image document, got {d}")))
            })
            .collect::<Result<_>>()?;

        let model = self.image_model.clone();
        tokio::task::spawn_blocking(move || model.embed(paths, None))
            .await
            .map_err(|e| Error::embedding(e.to_string()))?
            .map_err(|e| Error::embedding(e.to_string()))
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let vectors = embed_texts(self.text_model.clone(), vec![query.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("model returned no embedding for query"))
    }
}

impl std::fmt::Debug for ClipEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEmbedder")
            .field("dimensions", &CLIP_DIMS)
            .finish()
    }
}

/// Extracts text content, rejecting non-text documents.
fn collect_texts(documents: &[Document]) -> Result<Vec<String>> {
    documents
        .iter()
        .map(|d| {
            d.as_text()
                .map(|t| t.to_string())
                .ok_or_else(|| Error::embedding(format!("expected text document, got {d}")))
        })
        .collect()
}

/// Runs fastembed text inference on a blocking thread.
async fn embed_texts(model: Arc<TextEmbedding>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    tokio::task::spawn_blocking(move || model.embed(texts, None))
        .await
        .map_err(|e| Error::embedding(e.to_string()))?
        .map_err(|e| Error::embedding(e.to_string()))
}
