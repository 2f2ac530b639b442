//! Block-scoped gas budget shared by every message of a block.

use core::fmt;

/// Remaining gas of a block.
///
/// The pool is not internally synchronized: a block applies its messages
/// one at a time, each with exclusive access to the pool.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GasPool(u64);

/// Gas pool error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GasPoolError {
	/// The pool holds less gas than requested.
	LimitReached {
		/// Gas left in the pool.
		available: u64,
		/// Gas requested.
		requested: u64,
	},
}

impl fmt::Display for GasPoolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::LimitReached {
				available,
				requested,
			} => write!(f, "gas limit reached: {requested} requested, {available} available"),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for GasPoolError {}

impl GasPool {
	#[must_use]
	pub const fn new(gas: u64) -> Self {
		Self(gas)
	}

	/// Gas left in the pool.
	#[must_use]
	pub const fn gas(&self) -> u64 {
		self.0
	}

	/// Return gas to the pool.
	pub fn add_gas(&mut self, amount: u64) {
		self.0 = self.0.saturating_add(amount);
	}

	/// Take `amount` out of the pool. Nothing is taken when the pool holds
	/// less than `amount`.
	///
	/// # Errors
	/// Return `GasPoolError::LimitReached` if the pool holds less than `amount`
	pub fn sub_gas(&mut self, amount: u64) -> Result<(), GasPoolError> {
		match self.0.checked_sub(amount) {
			Some(left) => {
				self.0 = left;
				Ok(())
			}
			None => Err(GasPoolError::LimitReached {
				available: self.0,
				requested: amount,
			}),
		}
	}
}

impl fmt::Display for GasPool {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
