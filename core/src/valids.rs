use crate::prelude::*;
use crate::Opcode;

/// Mapping of valid jump destination from code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Valids(Vec<bool>);

impl Valids {
	/// Create a new valid mapping from given code bytes. Bytes that are
	/// immediate data of a `PUSH` are never valid destinations.
	#[must_use]
	pub fn new(code: &[u8]) -> Self {
		let mut valids: Vec<bool> = vec![false; code.len()];

		let mut i = 0;
		while i < code.len() {
			let opcode = Opcode(code[i]);
			if opcode == Opcode::JUMPDEST {
				valids[i] = true;
				i += 1;
			} else {
				i += 1 + opcode.push_width();
			}
		}

		Self(valids)
	}

	/// Get the length of the valid mapping. This is the same as the
	/// code bytes.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the valids list is empty
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` if the position is a valid jump destination.
	#[inline]
	#[must_use]
	pub fn is_valid(&self, position: usize) -> bool {
		self.0.get(position).copied().unwrap_or(false)
	}
}
