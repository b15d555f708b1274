//! Order-k Markov chain over arbitrary tokens.
//!
//! This crate provides a generic Markov chain including:
//! - Frequency distributions with deterministic indexed sampling
//! - Fixed-length context windows padded with a sentinel value
//! - Ingestion of token sequences into a transition table
//! - Pull-based generation driven by a caller-supplied random source
//!
//! Tokenization, file handling and any string-specific normalization are
//! left to the caller. The only entry point most callers need is [`Chain`].

/// Chain model, its internal structures and generation logic.
pub mod model;

/// Error type shared by every operation of the chain.
pub mod error;

pub use error::ChainError;
pub use model::chain::Chain;
pub use model::generator::Generator;

use std::fmt::Debug;
use std::hash::Hash;

/// Values a chain can learn and emit.
///
/// Blanket-implemented for every `Clone + Eq + Hash + Debug` type.
pub trait Token: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Token for T {}
