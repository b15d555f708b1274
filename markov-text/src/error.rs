use std::io;
use std::path::PathBuf;

use markov_core::ChainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
	#[error("failed to read {}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("tokenizer regex failed")]
	Regex(#[from] fancy_regex::Error),

	#[error("unknown split mode `{0}`, expected word, char or boundary")]
	UnknownMode(String),

	#[error("corpus worker stopped before sending its chain")]
	Worker,

	#[error(transparent)]
	Chain(#[from] ChainError),
}
