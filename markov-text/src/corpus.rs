use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use markov_core::Chain;

use crate::error::TextError;
use crate::normalize::normalize_tokens;
use crate::tokenize::Tokenizer;

/// Reads a whole text file into memory.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String, TextError> {
	let path = path.as_ref();
	fs::read_to_string(path).map_err(|source| TextError::Io { path: path.to_owned(), source })
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/sherlock.txt"` → `"sherlock"`
/// - `"sherlock.txt"` → `"sherlock"`
pub fn file_stem<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let stem = path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Tokenizes `text`, normalizes the tokens and ingests them as one sequence.
///
/// Returns the number of tokens ingested.
pub fn ingest_text(chain: &mut Chain<String>, tokenizer: &Tokenizer, text: &str) -> Result<usize, TextError> {
	let tokens: Vec<String> = normalize_tokens(tokenizer.tokenize(text)?).collect();
	let count = tokens.len();
	chain.ingest(tokens)?;
	Ok(count)
}

/// Builds one chain from several files, each file being one sequence.
///
/// # Behavior
/// - Splits the file list into one chunk per CPU.
/// - Spawns a thread per chunk building a partial chain.
/// - Merges the partial chains in chunk order, so the result is the same
///   as ingesting the files one after another.
///
/// # Errors
/// Returns the first error hit by a worker (unreadable file, regex
/// failure), or `Worker` if a worker died without answering.
pub fn load_chain<P>(order: usize, paths: &[P], tokenizer: &Tokenizer) -> Result<Chain<String>, TextError>
where
	P: AsRef<Path>,
{
	let mut chain = Chain::new(order, String::new())?;
	if paths.is_empty() {
		return Ok(chain);
	}

	let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_owned()).collect();
	let chunk_size = paths.len().div_ceil(num_cpus::get()).max(1);

	let (tx, rx) = mpsc::channel();
	let mut workers = 0;
	for (index, chunk) in paths.chunks(chunk_size).enumerate() {
		let tx = tx.clone();
		let chunk = chunk.to_vec();
		let tokenizer = tokenizer.clone();

		thread::spawn(move || {
			let partial = load_partial(order, &chunk, &tokenizer);
			// The receiver only goes away once every worker reported.
			let _ = tx.send((index, partial));
		});
		workers += 1;
	}
	drop(tx);

	let mut partials: Vec<(usize, Result<Chain<String>, TextError>)> = rx.iter().collect();
	if partials.len() != workers {
		return Err(TextError::Worker);
	}
	partials.sort_by_key(|(index, _)| *index);

	for (_, partial) in partials {
		chain.merge(&partial?)?;
	}

	info!(
		"loaded {} files into an order-{} chain with {} contexts",
		paths.len(),
		order,
		chain.table().len()
	);
	Ok(chain)
}

fn load_partial(order: usize, paths: &[PathBuf], tokenizer: &Tokenizer) -> Result<Chain<String>, TextError> {
	let mut chain = Chain::new(order, String::new())?;
	for path in paths {
		let text = read_file(path)?;
		let count = ingest_text(&mut chain, tokenizer, &text)?;
		debug!("{}: {} tokens", path.display(), count);
	}
	Ok(chain)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tokenize::SplitMode;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use std::env;
	use std::process;

	/// Fresh scratch directory for one test.
	fn scratch(name: &str) -> PathBuf {
		let dir = env::temp_dir().join(format!("markov-text-{}-{}", process::id(), name));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	fn word_tokenizer() -> Tokenizer {
		Tokenizer::new(SplitMode::Word).unwrap()
	}

	#[test]
	fn file_helpers() {
		let dir = scratch("helpers");
		fs::write(dir.join("b.txt"), "b").unwrap();
		fs::write(dir.join("a.txt"), "a").unwrap();
		fs::write(dir.join("notes.md"), "skip").unwrap();

		assert_eq!(list_files(&dir, "txt").unwrap(), vec!["a.txt", "b.txt"]);
		assert_eq!(file_stem(dir.join("a.txt")).unwrap(), "a");
		assert_eq!(read_file(dir.join("b.txt")).unwrap(), "b");
		assert!(matches!(read_file(dir.join("missing.txt")), Err(TextError::Io { .. })));
	}

	#[test]
	fn ingest_text_trims_words() {
		let mut chain = Chain::new(1, String::new()).unwrap();
		let count = ingest_text(&mut chain, &word_tokenizer(), "to be  or not").unwrap();

		assert_eq!(count, 4);
		let after_be = chain.distribution(&["be".to_owned()]).unwrap();
		assert_eq!(after_be.count(&"or".to_owned()), 1);
	}

	#[test]
	fn loading_files_matches_sequential_ingestion() {
		let dir = scratch("load");
		let texts = [
			"the quick brown fox jumps over the lazy dog",
			"the lazy cat sleeps",
			"a quick fox and a lazy dog",
			"",
			"over and over the fox runs",
		];
		let mut paths = Vec::new();
		for (i, text) in texts.iter().enumerate() {
			let path = dir.join(format!("{i}.txt"));
			fs::write(&path, text).unwrap();
			paths.push(path);
		}

		let tokenizer = word_tokenizer();
		let loaded = load_chain(2, &paths, &tokenizer).unwrap();

		let mut sequential = Chain::new(2, String::new()).unwrap();
		for text in texts {
			ingest_text(&mut sequential, &tokenizer, text).unwrap();
		}

		assert_eq!(loaded.table().len(), sequential.table().len());
		assert_eq!(
			loaded.generate(40, StdRng::seed_from_u64(3)).unwrap(),
			sequential.generate(40, StdRng::seed_from_u64(3)).unwrap()
		);
	}

	#[test]
	fn missing_file_fails_the_load() {
		let dir = scratch("missing");
		let result = load_chain(1, &[dir.join("nope.txt")], &word_tokenizer());
		assert!(matches!(result, Err(TextError::Io { .. })));
	}

	#[test]
	fn no_files_gives_untrained_chain() {
		let chain = load_chain::<PathBuf>(3, &[], &word_tokenizer()).unwrap();
		assert!(!chain.is_trained());
		assert_eq!(chain.order(), 3);
	}
}
