use std::collections::HashMap;
use std::iter;

use crate::Token;
use crate::error::ChainError;
use super::context::ContextKey;
use super::distribution::FrequencyDistribution;

/// The learned model: every observed context mapped to its successors.
///
/// # Responsibilities
/// - Ingest token sequences, sliding a context window across them
/// - Pad each sequence with sentinels so termination is learned too
/// - Provide read-only lookups for generation
/// - Merge with another table of the same order
///
/// # Invariants
/// - Every key has exactly `order` elements
/// - A key is present iff at least one value was observed after it
/// - The table only grows; nothing is ever removed
#[derive(Clone, Debug)]
pub struct TransitionTable<T> {
	order: usize,
	transitions: HashMap<ContextKey<T>, FrequencyDistribution<T>>,
}

impl<T: Token> TransitionTable<T> {
	/// Creates an empty table for contexts of length `order`.
	pub(crate) fn new(order: usize) -> Self {
		Self { order, transitions: HashMap::new() }
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Returns the successors recorded for `context`, if any.
	///
	/// Accepts either a `ContextKey` or a plain slice of `order` values.
	pub fn get<Q>(&self, context: &Q) -> Option<&FrequencyDistribution<T>>
	where
		ContextKey<T>: std::borrow::Borrow<Q>,
		Q: std::hash::Hash + Eq + ?Sized,
	{
		self.transitions.get(context)
	}

	/// Iterates over all recorded contexts, in no particular order.
	pub fn contexts(&self) -> impl Iterator<Item = &ContextKey<T>> {
		self.transitions.keys()
	}

	/// Records one observation of `next` following `key`.
	fn record(&mut self, key: &ContextKey<T>, next: T) {
		// Only clone the key when it is new.
		match self.transitions.get_mut(key) {
			Some(distribution) => distribution.add(next),
			None => {
				let mut distribution = FrequencyDistribution::new();
				distribution.add(next);
				self.transitions.insert(key.clone(), distribution);
			}
		}
	}

	/// Ingests one finite sequence.
	///
	/// The window starts as `order` sentinels, each token is recorded after
	/// the current window and then pushed into it. Once the input is
	/// exhausted, `order` more sentinels are recorded the same way, so the
	/// table learns how a sequence winds down to the all-sentinel context.
	///
	/// Returns the number of transitions recorded.
	pub(crate) fn ingest<I>(&mut self, tokens: I, sentinel: &T) -> usize
	where
		I: IntoIterator<Item = T>,
	{
		let mut key = ContextKey::initial(self.order, sentinel);
		let mut recorded = 0;

		let padding = iter::repeat_n(sentinel.clone(), self.order);
		for value in tokens.into_iter().chain(padding) {
			self.record(&key, value.clone());
			key = key.advance(value);
			recorded += 1;
		}

		recorded
	}

	/// Merges another table into this one.
	///
	/// Counts of matching contexts are summed, new contexts are cloned.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the orders differ.
	pub(crate) fn merge(&mut self, other: &Self) -> Result<(), ChainError> {
		if self.order != other.order {
			return Err(ChainError::OrderMismatch { expected: self.order, found: other.order });
		}

		for (key, distribution) in &other.transitions {
			if let Some(existing) = self.transitions.get_mut(key) {
				existing.merge(distribution);
			} else {
				self.transitions.insert(key.clone(), distribution.clone());
			}
		}

		Ok(())
	}
}
