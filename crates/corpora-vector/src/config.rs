//! Vector store configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Vector store backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum VectorStoreConfig {
    /// Qdrant vector database.
    Qdrant(QdrantConfig),
    /// Local in-memory store with an optional snapshot directory.
    Local(LocalConfig),
}

impl VectorStoreConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Qdrant(_) => "qdrant",
            Self::Local(_) => "local",
        }
    }
}

/// Qdrant connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Qdrant server URL, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl QdrantConfig {
    /// Creates a new configuration for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory for collection snapshots. When set, collections are loaded
    /// from it at startup and written back after every upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_dir: Option<PathBuf>,
}

impl LocalConfig {
    /// Creates an in-memory configuration without persistence.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration persisting snapshots to the given directory.
    pub fn persisted(dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: Some(dir.into()),
        }
    }
}
