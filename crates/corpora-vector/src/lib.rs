#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod local;
pub mod qdrant;

mod config;
mod error;
mod store;

pub use config::{LocalConfig, QdrantConfig, VectorStoreConfig};
pub use error::{VectorError, VectorResult};
pub use store::{SearchOptions, SearchResult, VectorData, VectorStore, VectorStoreBackend};

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "corpora_vector";
