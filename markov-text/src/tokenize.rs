use std::fmt;
use std::str::FromStr;

use fancy_regex::Regex;

use crate::error::TextError;

/// How input text is cut into tokens.
///
/// Every mode splits on zero-width positions found by a lookbehind, so
/// no character is ever lost: concatenating the tokens of a text gives
/// the text back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMode {
	/// After a whitespace character that follows a word character.
	/// Tokens keep their trailing whitespace.
	Word,
	/// After every character except a line break.
	Char,
	/// After any non-word character that follows a word character, so
	/// punctuation sticks to the word before it.
	Boundary,
}

impl SplitMode {
	fn pattern(self) -> &'static str {
		match self {
			SplitMode::Word => r"(?<=\w\s)",
			SplitMode::Char => r"(?<=.)",
			SplitMode::Boundary => r"(?<=\w\W)",
		}
	}

	/// Separator to put between generated tokens when printing them.
	pub fn delimiter(self) -> &'static str {
		match self {
			SplitMode::Word | SplitMode::Boundary => " ",
			SplitMode::Char => "",
		}
	}
}

impl FromStr for SplitMode {
	type Err = TextError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"word" => Ok(SplitMode::Word),
			"char" => Ok(SplitMode::Char),
			"boundary" => Ok(SplitMode::Boundary),
			_ => Err(TextError::UnknownMode(s.to_owned())),
		}
	}
}

impl fmt::Display for SplitMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SplitMode::Word => "word",
			SplitMode::Char => "char",
			SplitMode::Boundary => "boundary",
		};
		f.write_str(name)
	}
}

/// Regex-based splitter for one `SplitMode`.
///
/// Cheap to clone; worker threads each get their own copy.
#[derive(Clone, Debug)]
pub struct Tokenizer {
	mode: SplitMode,
	regex: Regex,
}

impl Tokenizer {
	pub fn new(mode: SplitMode) -> Result<Self, TextError> {
		Ok(Self { mode, regex: Regex::new(mode.pattern())? })
	}

	pub fn mode(&self) -> SplitMode {
		self.mode
	}

	/// Splits `text` at every match of the mode's pattern.
	///
	/// Empty pieces are dropped.
	///
	/// # Errors
	/// Returns an error if the regex engine gives up (backtrack limit).
	pub fn tokenize(&self, text: &str) -> Result<Vec<String>, TextError> {
		let mut tokens = Vec::new();
		let mut last_end = 0;

		for m in self.regex.find_iter(text) {
			let m = m?;
			if m.start() > last_end {
				tokens.push(text[last_end..m.start()].to_owned());
			}
			last_end = m.end();
		}
		if last_end < text.len() {
			tokens.push(text[last_end..].to_owned());
		}

		Ok(tokens)
	}
}
