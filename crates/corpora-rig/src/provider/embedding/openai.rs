//! OpenAI embedding provider.

use async_trait::async_trait;
use corpora_core::{Document, Modality};
use rig::embeddings::EmbeddingModel as RigEmbeddingModel;
use rig::prelude::EmbeddingsClient;
use rig::providers::openai;

use super::Embedder;
use crate::{Error, Result};

/// Text embedder backed by the OpenAI embeddings API.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    model: openai::EmbeddingModel,
    model_name: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder for the given model and dimension.
    pub fn new(api_key: &str, model_name: &str, dimensions: usize) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e.to_string()))?;

        Ok(Self {
            model: client.embedding_model_with_ndims(model_name, dimensions),
            model_name: model_name.to_string(),
        })
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = documents
            .iter()
            .map(|d| {
                d.as_text()
                    .map(|t| t.to_string())
                    .ok_or_else(|| Error::embedding(format!("expected text document, got {d}")))
            })
            .collect::<Result<_>>()?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed_texts(texts)
            .await
            .map_err(|e| Error::provider("openai", e.to_string()))?;

        Ok(embeddings
            .into_iter()
            .map(|e| e.vec.into_iter().map(|v| v as f32).collect())
            .collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embedding = self
            .model
            .embed_text(query)
            .await
            .map_err(|e| Error::provider("openai", e.to_string()))?;

        Ok(embedding.vec.into_iter().map(|v| v as f32).collect())
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model_name)
            .finish()
    }
}
