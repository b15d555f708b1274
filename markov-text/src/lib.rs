//! Text front-end for `markov-core`.
//!
//! Turns files and strings into token sequences a `Chain<String>` can
//! ingest:
//! - Regex splitting by word, character or word boundary
//! - Whitespace normalization of multi-character tokens
//! - Multi-file loading on worker threads
//!
//! The chain itself knows nothing about strings; everything text-specific
//! lives here.

/// Splitting text into tokens.
pub mod tokenize;

/// Per-token normalization applied before ingestion.
pub mod normalize;

/// File helpers and corpus loading.
pub mod corpus;

/// Error type of this crate.
pub mod error;

pub use error::TextError;
pub use tokenize::{SplitMode, Tokenizer};
