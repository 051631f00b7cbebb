#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod document;

pub use document::{Document, DocumentContent, Modality};

/// Tracing target for the core library.
pub const TRACING_TARGET: &str = "corpora_core";
