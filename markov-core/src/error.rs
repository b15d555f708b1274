use thiserror::Error;

/// Errors reported by the chain.
///
/// `SampleOutOfRange` signals a broken internal invariant; every other
/// variant is a usage-contract violation. None of them is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
	#[error("chain order must be at least 1")]
	ZeroOrder,

	#[error("sample index {index} out of range for distribution of total {total}")]
	SampleOutOfRange { index: usize, total: usize },

	#[error("no transitions recorded for context {context}")]
	UnseenContext { context: String },

	#[error("chain has not ingested any sequence")]
	Untrained,

	#[error("chain has only ingested empty sequences")]
	NoTokens,

	#[error("token at position {position} equals the sentinel")]
	SentinelToken { position: usize },

	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	#[error("sentinel mismatch between merged chains")]
	SentinelMismatch,
}
