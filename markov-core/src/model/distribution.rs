use std::collections::HashMap;

use rand::Rng;

use crate::Token;
use crate::error::ChainError;

/// Successor counts observed after one context.
///
/// Conceptually, this is the set of outgoing edges of a Markov chain node,
/// each weighted by how many times it was observed.
///
/// ## Responsibilities:
/// - Accumulate occurrences during ingestion
/// - Resolve a flat index into a value (deterministic)
/// - Draw a value with probability `count / total` (random)
/// - Merge with the distribution of the same context from another chain
///
/// ## Invariants
/// - `total` equals the sum of all counts, i.e. the number of `add` calls
/// - Every count is strictly positive
/// - Entries keep the order in which values were first observed
#[derive(Clone, Debug)]
pub struct FrequencyDistribution<T> {
	/// Distinct values with their counts, in first-observed order.
	entries: Vec<(T, usize)>,
	/// Position of each value in `entries`.
	positions: HashMap<T, usize>,
	total: usize,
}

impl<T: Token> FrequencyDistribution<T> {
	/// Creates an empty distribution.
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			positions: HashMap::new(),
			total: 0,
		}
	}

	/// Records one occurrence of `value`.
	///
	/// - If the value was already observed, its count is increased.
	/// - Otherwise it is appended with a count of 1.
	pub fn add(&mut self, value: T) {
		self.add_count(value, 1);
	}

	fn add_count(&mut self, value: T, count: usize) {
		match self.positions.get(&value) {
			Some(&position) => self.entries[position].1 += count,
			None => {
				self.positions.insert(value.clone(), self.entries.len());
				self.entries.push((value, count));
			}
		}
		self.total += count;
	}

	/// Returns the value at position `index` of the flattened distribution.
	///
	/// The flattened form lists each distinct value `count` times in a row,
	/// in insertion order. The lookup is an O(n) scan with cumulative
	/// subtraction, so no flattened copy is ever built.
	///
	/// # Errors
	/// Returns `SampleOutOfRange` if `index >= total`.
	pub fn sample_by_index(&self, index: usize) -> Result<&T, ChainError> {
		let out_of_range = ChainError::SampleOutOfRange { index, total: self.total };
		if index >= self.total {
			return Err(out_of_range);
		}

		let mut remaining = index;
		for (value, count) in &self.entries {
			if remaining < *count {
				return Ok(value);
			}
			remaining -= count;
		}

		// Unreachable while `total` matches the entries.
		Err(out_of_range)
	}

	/// Draws a value using weighted random sampling.
	///
	/// The probability of selecting a value is `count / total`.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&T, ChainError> {
		if self.total == 0 {
			return Err(ChainError::SampleOutOfRange { index: 0, total: 0 });
		}
		self.sample_by_index(rng.random_range(0..self.total))
	}

	/// Number of times `value` was added.
	pub fn count(&self, value: &T) -> usize {
		self.positions
			.get(value)
			.map_or(0, |&position| self.entries[position].1)
	}

	/// Sum of all counts.
	pub fn total(&self) -> usize {
		self.total
	}

	/// Number of distinct values.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates over `(value, count)` in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
		self.entries.iter().map(|(value, count)| (value, *count))
	}

	/// Merges another distribution into this one.
	///
	/// Counts are summed. Values unknown to `self` are appended in the
	/// order `other` first observed them, which yields the same result as
	/// having replayed `other`'s additions after `self`'s.
	pub fn merge(&mut self, other: &Self) {
		for (value, count) in &other.entries {
			self.add_count(value.clone(), *count);
		}
	}
}

impl<T: Token> Default for FrequencyDistribution<T> {
	fn default() -> Self {
		Self::new()
	}
}
