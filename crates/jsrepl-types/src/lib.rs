//! Shared types for the jsrepl console.
//!
//! This crate defines the source spans, pipeline error types and log entry
//! kinds used by the transform, evaluator and wasm crates.

mod error;
mod log;
mod span;

pub use error::{ParseError, TransformError};
pub use log::LogKind;
pub use span::{SourceFile, Span};

/// Result type used throughout the fragment transform pipeline.
pub type TransformResult<T> = std::result::Result<T, TransformError>;
