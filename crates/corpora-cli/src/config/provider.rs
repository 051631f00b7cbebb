//! Model provider and vector backend configuration.

use std::path::PathBuf;

use clap::Parser;
use corpora_vector::{LocalConfig, QdrantConfig, VectorStoreConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Provider credentials and endpoints.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI API key for the agent's chat model.
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// OpenAI chat model used by the agent.
    #[clap(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub openai_model: String,

    /// Qdrant server URL. When unset, the local snapshot store is used.
    #[clap(long, env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Qdrant API key.
    #[clap(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    pub qdrant_api_key: Option<String>,
}

impl ProviderConfig {
    /// Resolves the vector store configuration: Qdrant when a URL is
    /// configured, otherwise the local store with an optional snapshot
    /// directory.
    pub fn vector_store_config(&self, persist_dir: Option<PathBuf>) -> VectorStoreConfig {
        match &self.qdrant_url {
            Some(url) => {
                let mut config = QdrantConfig::new(url);
                if let Some(api_key) = &self.qdrant_api_key {
                    config = config.with_api_key(api_key);
                }
                VectorStoreConfig::Qdrant(config)
            }
            None => VectorStoreConfig::Local(match persist_dir {
                Some(dir) => LocalConfig::persisted(dir),
                None => LocalConfig::in_memory(),
            }),
        }
    }

    /// Logs the provider configuration (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            model = %self.openai_model,
            qdrant_url = self.qdrant_url.as_deref().unwrap_or("(local store)"),
            "Provider configuration"
        );
    }
}
