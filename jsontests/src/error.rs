use evm::TransitionError;
use primitive_types::H160;
use std::path::PathBuf;
use thiserror::Error;

/// Source path for tests errors
#[derive(Debug, Error)]
pub enum SourcePathError {
	#[error("source tests not found for: {0}")]
	SourceTestsNotFound(PathBuf),
}

/// A state test whose outcome differs from its expectation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TestError {
	#[error("message rejected: {0}")]
	UnexpectedRejection(TransitionError),
	#[error("message applied, expected rejection {expected}")]
	MissingRejection { expected: String },
	#[error("rejected with {got}, expected {expected}")]
	WrongRejection { expected: String, got: String },
	#[error("failed flag is {got}, expected {expected}")]
	FailedFlag { expected: bool, got: bool },
	#[error("used {got} gas, expected {expected}")]
	UsedGas { expected: u64, got: u64 },
	#[error("returned 0x{got}, expected 0x{expected}")]
	ReturnValue { expected: String, got: String },
	#[error("account {0:?} is missing")]
	MissingAccount(H160),
	#[error("account {0:?} should not exist")]
	UnexpectedAccount(H160),
	#[error("{field} of account {address:?} differs")]
	AccountMismatch { address: H160, field: &'static str },
}
