use log::debug;
use rand::Rng;

use crate::Token;
use crate::error::ChainError;
use super::distribution::FrequencyDistribution;
use super::generator::Generator;
use super::table::TransitionTable;

/// An order-k Markov chain over tokens of type `T`.
///
/// `Chain` binds a fixed `order` and a sentinel value to one
/// `TransitionTable`. The sentinel marks sequence boundaries: it pads the
/// context before the first token and after the last one, and never
/// appears in generated output.
///
/// # Responsibilities
/// - Validate the order and guard the sentinel against real tokens
/// - Ingest sequences, each one starting from a blank context
/// - Hand out generators reading the learned table
/// - Merge with chains built elsewhere (e.g. one per input file)
///
/// # Concurrency
/// Generation only reads the table, ingestion mutates it. No locking is
/// done here: sharing a chain between threads while ingesting requires
/// external synchronization.
#[derive(Clone, Debug)]
pub struct Chain<T> {
	sentinel: T,
	table: TransitionTable<T>,
}

impl<T: Token> Chain<T> {
	/// Creates an empty chain of the given order.
	///
	/// `sentinel` must never be equal to a token the chain should learn;
	/// this is checked on every ingestion.
	///
	/// # Errors
	/// Returns `ZeroOrder` if `order == 0`.
	pub fn new(order: usize, sentinel: T) -> Result<Self, ChainError> {
		if order == 0 {
			return Err(ChainError::ZeroOrder);
		}
		Ok(Self { sentinel, table: TransitionTable::new(order) })
	}

	pub fn order(&self) -> usize {
		self.table.order()
	}

	pub fn sentinel(&self) -> &T {
		&self.sentinel
	}

	/// Read-only view on the learned model.
	pub fn table(&self) -> &TransitionTable<T> {
		&self.table
	}

	/// Returns `true` once at least one sequence has been ingested.
	pub fn is_trained(&self) -> bool {
		!self.table.is_empty()
	}

	/// Successors recorded after `context` (exactly `order` values).
	pub fn distribution(&self, context: &[T]) -> Option<&FrequencyDistribution<T>> {
		self.table.get(context)
	}

	/// Adds a finite sequence to the chain.
	///
	/// See [`Chain::ingest_with`] for the details.
	pub fn ingest<I>(&mut self, tokens: I) -> Result<(), ChainError>
	where
		I: IntoIterator<Item = T>,
	{
		self.ingest_with(tokens, |token| token)
	}

	/// Adds a finite sequence to the chain, passing each token through
	/// `transform` first.
	///
	/// # Behavior
	/// - The context starts as `order` sentinels; nothing carries over from
	///   a previous call.
	/// - After the last token, `order` sentinels are recorded so the chain
	///   learns how sequences end.
	/// - An empty sequence still records that padding.
	///
	/// # Errors
	/// Returns `SentinelToken` if a (transformed) token equals the sentinel.
	/// The chain is left untouched in that case.
	pub fn ingest_with<I, F>(&mut self, tokens: I, transform: F) -> Result<(), ChainError>
	where
		I: IntoIterator<Item = T>,
		F: FnMut(T) -> T,
	{
		let tokens: Vec<T> = tokens.into_iter().map(transform).collect();
		if let Some(position) = tokens.iter().position(|token| *token == self.sentinel) {
			return Err(ChainError::SentinelToken { position });
		}

		let count = tokens.len();
		let recorded = self.table.ingest(tokens, &self.sentinel);
		debug!(
			"ingested {} tokens ({} transitions), table holds {} contexts",
			count,
			recorded,
			self.table.len()
		);
		Ok(())
	}

	/// Returns a generator producing tokens from this chain.
	///
	/// The rng is owned by the generator; pass `&mut rng` to keep using
	/// it afterwards.
	///
	/// # Errors
	/// Returns `Untrained` if nothing was ever ingested.
	pub fn stream<R: Rng>(&self, rng: R) -> Result<Generator<'_, T, R>, ChainError> {
		if !self.is_trained() {
			return Err(ChainError::Untrained);
		}
		Ok(Generator::new(&self.table, &self.sentinel, rng))
	}

	/// Generates exactly `count` tokens.
	///
	/// # Errors
	/// - `Untrained` if nothing was ever ingested
	/// - `NoTokens` if only empty sequences were ingested
	pub fn generate<R: Rng>(&self, count: usize, rng: R) -> Result<Vec<T>, ChainError> {
		self.stream(rng)?.take(count).collect()
	}

	/// Merges another chain into this one.
	///
	/// Transition counts are summed. Merging the chains of several
	/// sequences in order gives the same chain as ingesting those
	/// sequences one after another.
	///
	/// # Errors
	/// Returns an error if the orders or the sentinels differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ChainError> {
		if self.sentinel != other.sentinel {
			return Err(ChainError::SentinelMismatch);
		}
		self.table.merge(&other.table)?;
		debug!("merged chain, table holds {} contexts", self.table.len());
		Ok(())
	}
}
