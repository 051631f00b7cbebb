#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod agent;
mod error;
pub mod index;
mod observer;
pub mod provider;
pub mod reader;
mod splitter;
pub mod tool;

pub use error::{Error, Result};
pub use observer::{PipelineObserver, TracingObserver};
pub use splitter::SplitterConfig;

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "corpora_rig";
