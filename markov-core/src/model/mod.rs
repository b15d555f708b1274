//! Building blocks of the Markov chain.
//!
//! - Weighted successor counts (`FrequencyDistribution`)
//! - Sliding context windows (`ContextKey`)
//! - The learned model and ingestion (`TransitionTable`)
//! - Pull-based sampling (`Generator`)
//! - The public facade (`Chain`)

/// Insertion-ordered successor counts for one context.
///
/// Supports deterministic indexed lookup and weighted random sampling.
pub mod distribution;

/// Fixed-length window of the last `order` tokens or sentinels.
pub mod context;

/// Mapping from context to successor distribution, and its ingestion.
pub mod table;

/// Stateful producer of an unbounded token sequence.
pub mod generator;

/// Facade binding an order and a sentinel to one transition table.
pub mod chain;
