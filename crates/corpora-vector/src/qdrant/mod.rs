//! Qdrant vector database backend.

mod backend;

pub use backend::QdrantBackend;
