use crate::prelude::*;
use crate::Opcode;
use core::fmt;

/// Exit reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
	/// Machine has succeeded.
	Succeed(ExitSucceed),
	/// Machine returns a normal EVM error.
	Error(ExitError),
	/// Machine halted through an operation flagged as reverting.
	Revert(ExitRevert),
}

impl ExitReason {
	/// Whether the exit is succeeded.
	#[must_use]
	pub const fn is_succeed(&self) -> bool {
		matches!(self, Self::Succeed(_))
	}

	/// Whether the exit is error.
	#[must_use]
	pub const fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Whether the exit is revert.
	#[must_use]
	pub const fn is_revert(&self) -> bool {
		matches!(self, Self::Revert(_))
	}
}

impl fmt::Display for ExitReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Succeed(s) => write!(f, "succeed: {s:?}"),
			Self::Error(e) => write!(f, "error: {e}"),
			Self::Revert(r) => write!(f, "revert: {r:?}"),
		}
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop, or ran past the end of its code.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
	/// Machine encountered an explicit suicide.
	Suicided,
}

impl From<ExitSucceed> for ExitReason {
	fn from(s: ExitSucceed) -> Self {
		Self::Succeed(s)
	}
}

/// Exit revert reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitRevert {
	/// Machine encountered an explicit revert.
	Reverted,
}

impl From<ExitRevert> for ExitReason {
	fn from(s: ExitRevert) -> Self {
		Self::Revert(s)
	}
}

/// Exit error reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// Trying to pop from an empty stack.
	#[cfg_attr(feature = "with-codec", codec(index = 0))]
	StackUnderflow,
	/// Trying to push into a stack over stack limit.
	#[cfg_attr(feature = "with-codec", codec(index = 1))]
	StackOverflow,
	/// Jump destination is invalid.
	#[cfg_attr(feature = "with-codec", codec(index = 2))]
	InvalidJump,
	/// An opcode accesses memory region, but the region is invalid.
	#[cfg_attr(feature = "with-codec", codec(index = 3))]
	InvalidRange,
	/// Opcode is not part of the active instruction set.
	#[cfg_attr(feature = "with-codec", codec(index = 4))]
	InvalidCode(Opcode),
	/// Call stack is too deep (runtime).
	#[cfg_attr(feature = "with-codec", codec(index = 5))]
	CallTooDeep,
	/// Create opcode encountered collision (runtime).
	#[cfg_attr(feature = "with-codec", codec(index = 6))]
	CreateCollision,
	/// Execution runs out of gas (runtime).
	#[cfg_attr(feature = "with-codec", codec(index = 7))]
	OutOfGas,
	/// A gas or memory-size computation overflowed 64 bits.
	#[cfg_attr(feature = "with-codec", codec(index = 8))]
	GasUintOverflow,
	/// Not enough fund to start the execution (runtime).
	#[cfg_attr(feature = "with-codec", codec(index = 9))]
	OutOfFund,
	/// A state-modifying operation was attempted in a read-only frame.
	#[cfg_attr(feature = "with-codec", codec(index = 10))]
	WriteProtection,
	/// Nonce reached maximum value of 2^64-1.
	#[cfg_attr(feature = "with-codec", codec(index = 11))]
	MaxNonce,
	/// Other normal errors.
	#[cfg_attr(feature = "with-codec", codec(index = 12))]
	Other(Cow<'static, str>),
	/// Created code could not be paid for. The account is kept, without
	/// code.
	#[cfg_attr(feature = "with-codec", codec(index = 13))]
	CodeStoreOutOfGas,
}

impl From<ExitError> for ExitReason {
	fn from(s: ExitError) -> Self {
		Self::Error(s)
	}
}

impl fmt::Display for ExitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::StackUnderflow => f.write_str("stack underflow"),
			Self::StackOverflow => f.write_str("stack limit reached"),
			Self::InvalidJump => f.write_str("invalid jump destination"),
			Self::InvalidRange => f.write_str("invalid memory range"),
			Self::InvalidCode(opcode) => write!(f, "invalid opcode {opcode}"),
			Self::CallTooDeep => f.write_str("max call depth exceeded"),
			Self::CreateCollision => f.write_str("contract address collision"),
			Self::OutOfGas => f.write_str("out of gas"),
			Self::GasUintOverflow => f.write_str("gas uint64 overflow"),
			Self::OutOfFund => f.write_str("insufficient balance for transfer"),
			Self::WriteProtection => f.write_str("write protection"),
			Self::MaxNonce => f.write_str("nonce has max value"),
			Self::Other(reason) => f.write_str(reason),
			Self::CodeStoreOutOfGas => f.write_str("contract creation code storage out of gas"),
		}
	}
}
