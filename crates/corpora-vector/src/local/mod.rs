//! Local vector store with an optional snapshot directory.

mod backend;

pub use backend::LocalBackend;
