//! CLI configuration management.
//!
//! The configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── provider: ProviderConfig   # OpenAI credentials, Qdrant connection
//! └── pipeline: PipelineConfig   # Data directory, collections, prompts
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! corpora-cli --data-dir ./data --qdrant-url http://localhost:6334
//!
//! # Or via environment variables
//! DATA_DIR=./data QDRANT_URL=http://localhost:6334 corpora-cli
//! ```

mod pipeline;
mod provider;

use std::process;

use clap::Parser;
pub use pipeline::PipelineConfig;
pub use provider::ProviderConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "corpora")]
#[command(about = "Multimodal retrieval demo pipeline")]
#[command(version)]
pub struct Cli {
    /// Model provider and vector backend configuration.
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// Pipeline input and indexing configuration.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,
}

impl Cli {
    /// Loads environment variables from a .env file and parses CLI
    /// arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values
    /// are visible to clap's `env` defaults.
    pub fn init() -> Self {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
        Self::parse()
    }

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate(self.provider.qdrant_url.is_some())?;
        Ok(())
    }

    /// Logs configuration at startup (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.provider.log();
        self.pipeline.log();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            "Build information"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_with_required_args() {
        let cli = Cli::try_parse_from([
            "corpora",
            "--openai-api-key",
            "sk-test",
            "--data-dir",
            "./data",
        ])
        .unwrap();

        assert_eq!(cli.pipeline.text_collection, "text-collection");
        assert_eq!(cli.pipeline.image_collection, "image-collection");
        assert_eq!(cli.pipeline.top_k, 10);
    }

    #[test]
    fn from_persisted_requires_a_backend_location() {
        let cli = Cli::try_parse_from([
            "corpora",
            "--openai-api-key",
            "sk-test",
            "--from-persisted",
        ])
        .unwrap();

        assert!(cli.validate().is_err());
    }
}
