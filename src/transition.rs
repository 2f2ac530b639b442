//! # Message state transition
//!
//! [`apply_message`] applies one message against the executor's world state
//! and sorts the outcome into the two error classes of a transition:
//!
//! - A [`TransitionError`] means the message could never be valid against
//!   this state. Nothing is mutated and no gas is taken from the pool.
//! - Any other failure happens inside the message's execution. The message
//!   is still valid, its gas is charged, and [`ExecutionResult::failed`] is
//!   set.

use crate::backend::WorldState;
use crate::executor::stack::StackExecutor;
use crate::gas_pool::{GasPool, GasPoolError};
use crate::prelude::*;
use crate::{ExitError, ExitReason};
use core::fmt;
use primitive_types::{H160, U256};

/// A transaction-like request applied by [`apply_message`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
	/// Sender.
	pub from: H160,
	/// Recipient, `None` for a contract creation.
	pub to: Option<H160>,
	/// Value transferred to the recipient or the created contract.
	pub value: U256,
	/// Nonce the sender declares.
	pub nonce: u64,
	/// Whether `nonce` must match the sender's nonce.
	pub check_nonce: bool,
	/// Call input, or init code of a creation.
	pub data: Vec<u8>,
	/// Gas available to the execution.
	pub gas_limit: u64,
}

impl Message {
	/// A nonce-checked call message.
	#[must_use]
	pub const fn call(
		from: H160,
		to: H160,
		value: U256,
		nonce: u64,
		data: Vec<u8>,
		gas_limit: u64,
	) -> Self {
		Self {
			from,
			to: Some(to),
			value,
			nonce,
			check_nonce: true,
			data,
			gas_limit,
		}
	}

	/// A nonce-checked creation message.
	#[must_use]
	pub const fn create(
		from: H160,
		value: U256,
		nonce: u64,
		init_code: Vec<u8>,
		gas_limit: u64,
	) -> Self {
		Self {
			from,
			to: None,
			value,
			nonce,
			check_nonce: true,
			data: init_code,
			gas_limit,
		}
	}

	/// Skip the nonce check.
	#[must_use]
	pub const fn unchecked(mut self) -> Self {
		self.check_nonce = false;
		self
	}

	/// Whether the message creates a contract.
	#[must_use]
	pub const fn is_create(&self) -> bool {
		self.to.is_none()
	}
}

/// Outcome of a valid message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutionResult {
	/// Return data of the top level frame. For a successful creation this is
	/// the deployed code.
	pub return_value: Vec<u8>,
	/// Whether the execution failed or reverted. Its gas is charged anyway.
	pub failed: bool,
	/// Gas used, refunds deducted.
	pub used_gas: u64,
	/// Exit reason of the top level frame.
	pub reason: ExitReason,
	/// Address of the created contract, if the message created one.
	pub created_address: Option<H160>,
}

/// The message can never be applied against this state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransitionError {
	/// The declared nonce does not match the sender's.
	InvalidNonce {
		/// Sender.
		address: H160,
		/// Nonce of the sender account.
		expected: u64,
		/// Nonce declared by the message.
		got: u64,
	},
	/// The sender's nonce cannot be incremented.
	NonceMax {
		/// Sender.
		address: H160,
	},
	/// The block gas pool cannot cover the message's gas limit.
	GasLimitReached(GasPoolError),
	/// The sender cannot pay for the value of the message.
	InsufficientBalance {
		/// Sender.
		address: H160,
		/// Value of the message.
		value: U256,
	},
}

impl fmt::Display for TransitionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidNonce {
				address,
				expected,
				got,
			} => write!(f, "invalid nonce for {address:?}: expected {expected}, got {got}"),
			Self::NonceMax { address } => write!(f, "nonce of {address:?} has max value"),
			Self::GasLimitReached(e) => write!(f, "{e}"),
			Self::InsufficientBalance { address, value } => {
				write!(f, "insufficient balance of {address:?} to transfer {value}")
			}
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for TransitionError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::GasLimitReached(e) => Some(e),
			_ => None,
		}
	}
}

impl From<GasPoolError> for TransitionError {
	fn from(e: GasPoolError) -> Self {
		Self::GasLimitReached(e)
	}
}

/// Apply `message` against the executor's world state.
///
/// 1. The nonce is checked. A mismatch, or a nonce that cannot be
///    incremented, rejects the message before anything is touched.
/// 2. The message's gas limit is taken from `gas_pool`.
/// 3. The sender account is created if absent.
/// 4. A message without recipient runs the creation path, which increments
///    the sender's nonce itself. Otherwise the recipient account is created
///    if absent, the sender's nonce is incremented and the call path runs.
/// 5. A top level `OutOfFund` means the unconditional value transfer could
///    not be paid: every effect of the message is rolled back, the gas goes
///    back to the pool and the message is rejected. Any other failure only
///    sets [`ExecutionResult::failed`].
/// 6. Gas left unused, refunds included, goes back to the pool and pending
///    self-destructs are applied.
///
/// # Errors
/// Return `TransitionError` if the message can never be valid against this
/// state
pub fn apply_message<S: WorldState>(
	executor: &mut StackExecutor<'_, S>,
	message: &Message,
	gas_pool: &mut GasPool,
) -> Result<ExecutionResult, TransitionError> {
	let from = message.from;
	let nonce = executor.state().nonce(from);

	if message.check_nonce && nonce != message.nonce {
		return Err(TransitionError::InvalidNonce {
			address: from,
			expected: nonce,
			got: message.nonce,
		});
	}
	let Some(next_nonce) = nonce.checked_add(1) else {
		return Err(TransitionError::NonceMax { address: from });
	};

	gas_pool.sub_gas(message.gas_limit)?;
	let snapshot = executor.state_mut().snapshot();

	if !executor.state().exists(from) {
		executor.state_mut().create_account(from);
	}

	let (reason, created_address, return_value) = match message.to {
		None => executor.transact_create(
			from,
			message.value,
			message.data.clone(),
			message.gas_limit,
		),
		Some(to) => {
			if !executor.state().exists(to) {
				executor.state_mut().create_account(to);
			}
			executor.state_mut().set_nonce(from, next_nonce);

			let (reason, return_value) = executor.transact_call(
				from,
				to,
				message.value,
				message.data.clone(),
				message.gas_limit,
			);
			(reason, None, return_value)
		}
	};

	if reason == ExitReason::Error(ExitError::OutOfFund) {
		executor.state_mut().revert_to_snapshot(snapshot);
		gas_pool.add_gas(message.gas_limit);
		return Err(TransitionError::InsufficientBalance {
			address: from,
			value: message.value,
		});
	}

	let failed = !reason.is_succeed();
	if failed {
		log::debug!(target: "evm", "VM error applying message from {from:?}: {reason:?}");
	}

	let used_gas = executor.used_gas();
	gas_pool.add_gas(message.gas_limit.saturating_sub(used_gas));
	executor.state_mut().finalize();

	Ok(ExecutionResult {
		return_value,
		failed,
		used_gas,
		reason,
		created_address,
	})
}
