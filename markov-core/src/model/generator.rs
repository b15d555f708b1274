use std::iter::FusedIterator;

use log::trace;
use rand::Rng;

use crate::Token;
use crate::error::ChainError;
use super::context::ContextKey;
use super::table::TransitionTable;

/// Pull-based producer of an unbounded token sequence.
///
/// # Responsibilities
/// - Own a private context window, starting from all sentinels
/// - Sample each successor from the shared table with the given rng
/// - Swallow sentinels so callers only ever see real tokens
///
/// The table is only borrowed immutably: any number of generators can
/// read the same chain, and none of them disturbs another's state.
///
/// As an iterator it never ends on its own. After the first error it
/// yields `None`.
#[derive(Debug)]
pub struct Generator<'a, T, R> {
	table: &'a TransitionTable<T>,
	sentinel: &'a T,
	key: ContextKey<T>,
	rng: R,
	failed: bool,
}

impl<'a, T: Token, R: Rng> Generator<'a, T, R> {
	pub(crate) fn new(table: &'a TransitionTable<T>, sentinel: &'a T, rng: R) -> Self {
		Self {
			table,
			sentinel,
			key: ContextKey::initial(table.order(), sentinel),
			rng,
			failed: false,
		}
	}

	/// Produces the next real token.
	///
	/// Sentinels drawn along the way advance the window but are not
	/// returned.
	///
	/// # Errors
	/// - `UnseenContext` if the window reaches a context with no recorded successor
	/// - `NoTokens` if the table only knows the all-sentinel loop, which would
	///   otherwise never produce anything
	pub fn next_token(&mut self) -> Result<T, ChainError> {
		let table = self.table;
		loop {
			let distribution = table.get(&self.key).ok_or_else(|| ChainError::UnseenContext {
				context: format!("{:?}", self.key.as_slice()),
			})?;

			if self.key.is_blank(self.sentinel)
				&& distribution.iter().all(|(value, _)| value == self.sentinel)
			{
				return Err(ChainError::NoTokens);
			}

			let candidate = distribution.sample(&mut self.rng)?.clone();
			trace!("{:?} -> {:?}", self.key.as_slice(), candidate);
			self.key = self.key.advance(candidate.clone());

			if candidate != *self.sentinel {
				return Ok(candidate);
			}
		}
	}

	/// Current context window.
	pub fn context(&self) -> &[T] {
		self.key.as_slice()
	}
}

impl<T: Token, R: Rng> Iterator for Generator<'_, T, R> {
	type Item = Result<T, ChainError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}
		let result = self.next_token();
		self.failed = result.is_err();
		Some(result)
	}
}

impl<T: Token, R: Rng> FusedIterator for Generator<'_, T, R> {}
