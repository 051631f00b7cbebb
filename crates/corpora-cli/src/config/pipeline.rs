//! Pipeline input and indexing configuration.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Pipeline configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory containing the source PDFs and images.
    #[clap(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Snapshot directory for the local vector store backend.
    #[clap(long, env = "PERSIST_DIR")]
    pub persist_dir: Option<PathBuf>,

    /// Attach to collections persisted by an earlier run instead of
    /// reading and re-embedding the data directory.
    #[clap(long, env = "FROM_PERSISTED")]
    pub from_persisted: bool,

    /// Collection name for text chunks.
    #[clap(long, default_value = "text-collection")]
    pub text_collection: String,

    /// Collection name for images.
    #[clap(long, default_value = "image-collection")]
    pub image_collection: String,

    /// Results returned per index query.
    #[clap(long, default_value_t = 10)]
    pub top_k: usize,

    /// Prompt to run; may be repeated. Defaults to the built-in demo
    /// prompts.
    #[clap(long = "prompt")]
    pub prompts: Vec<String>,
}

impl PipelineConfig {
    /// Validates the pipeline configuration.
    ///
    /// `--from-persisted` needs somewhere to attach to: either a Qdrant
    /// URL or a snapshot directory.
    pub fn validate(&self, has_qdrant: bool) -> anyhow::Result<()> {
        if self.from_persisted && !has_qdrant && self.persist_dir.is_none() {
            anyhow::bail!(
                "--from-persisted requires either --qdrant-url or --persist-dir to attach to"
            );
        }
        Ok(())
    }

    /// Logs the pipeline configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            data_dir = %self.data_dir.display(),
            persist_dir = ?self.persist_dir,
            from_persisted = self.from_persisted,
            text_collection = %self.text_collection,
            image_collection = %self.image_collection,
            top_k = self.top_k,
            "Pipeline configuration"
        );
    }
}
