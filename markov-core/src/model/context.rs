use std::borrow::Borrow;
use std::iter;

use crate::Token;

/// The last `order` values seen, oldest first.
///
/// Keys are immutable value objects: once a key is stored in the
/// transition table it must never change, so moving forward always
/// builds a new key.
///
/// # Invariants
/// - The window length is fixed for the lifetime of the chain
/// - Equality and hashing are element-wise, in order
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextKey<T> {
	window: Box<[T]>,
}

impl<T: Token> ContextKey<T> {
	/// Creates the starting key: `order` copies of the sentinel.
	pub fn initial(order: usize, sentinel: &T) -> Self {
		Self { window: vec![sentinel.clone(); order].into_boxed_slice() }
	}

	/// Returns the successor key: oldest value dropped, `next` appended.
	///
	/// `self` is left untouched.
	pub fn advance(&self, next: T) -> Self {
		let window = self
			.window
			.iter()
			.skip(1)
			.cloned()
			.chain(iter::once(next))
			.collect();
		Self { window }
	}

	/// Returns `true` if every slot holds the sentinel.
	pub fn is_blank(&self, sentinel: &T) -> bool {
		self.window.iter().all(|value| value == sentinel)
	}

	pub fn as_slice(&self) -> &[T] {
		&self.window
	}

	pub fn order(&self) -> usize {
		self.window.len()
	}
}

impl<T: Token> From<&[T]> for ContextKey<T> {
	fn from(values: &[T]) -> Self {
		Self { window: values.into() }
	}
}

// Lets the table be queried with a plain slice. `Box<[T]>` hashes exactly
// like `[T]`, so the derived `Hash` stays consistent with this borrow.
impl<T> Borrow<[T]> for ContextKey<T> {
	fn borrow(&self) -> &[T] {
		&self.window
	}
}
