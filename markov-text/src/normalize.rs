/// Trims surrounding whitespace from tokens longer than one character.
///
/// Single characters are kept as-is, so a lone space or newline produced
/// by character splitting survives.
pub fn trim_word(token: String) -> String {
	if token.chars().count() > 1 {
		token.trim().to_owned()
	} else {
		token
	}
}

/// Applies [`trim_word`] and drops tokens left empty.
///
/// The empty string is the sentinel of text chains, so it can never be
/// ingested as a token.
pub fn normalize_tokens<I>(tokens: I) -> impl Iterator<Item = String>
where
	I: IntoIterator<Item = String>,
{
	tokens.into_iter().map(trim_word).filter(|token| !token.is_empty())
}
