//! Model providers.

pub mod embedding;
