use crate::error::TestError;
use crate::types::{Expectation, StateTest};
use evm::backend::{MemoryAccount, MemoryState, Vicinity};
use evm::executor::stack::StackExecutor;
use evm::{apply_message, ExecutionResult, GasPool, Message, TransitionError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of every test of a fixture file, in name order.
pub type FileOutcome = Vec<(String, Result<(), TestError>)>;

/// Name of a `TransitionError` variant, as fixtures spell it.
#[must_use]
pub const fn rejection_name(error: &TransitionError) -> &'static str {
	match error {
		TransitionError::InvalidNonce { .. } => "InvalidNonce",
		TransitionError::NonceMax { .. } => "NonceMax",
		TransitionError::GasLimitReached(_) => "GasLimitReached",
		TransitionError::InsufficientBalance { .. } => "InsufficientBalance",
	}
}

/// Apply the test's message to its pre state and check the expectation.
///
/// # Errors
/// Return `TestError` on the first mismatch
pub fn run_test(test: &StateTest) -> Result<(), TestError> {
	let config = test.fork.config();
	let pre: BTreeMap<_, MemoryAccount> = test
		.pre
		.iter()
		.map(|(address, account)| (*address, account.into()))
		.collect();
	let mut executor =
		StackExecutor::new(MemoryState::new(pre), &config, Vicinity::from(&test.env));

	let message = Message::from(&test.message);
	let mut pool = GasPool::new(test.env.gas_pool.unwrap_or(message.gas_limit));
	let result = apply_message(&mut executor, &message, &mut pool);

	match (result, &test.expect.rejected) {
		(Ok(result), None) => check_result(&test.expect, &result)?,
		(Ok(_), Some(expected)) => {
			return Err(TestError::MissingRejection {
				expected: expected.clone(),
			})
		}
		(Err(error), None) => return Err(TestError::UnexpectedRejection(error)),
		(Err(error), Some(expected)) => {
			let got = rejection_name(&error);
			if got != expected {
				return Err(TestError::WrongRejection {
					expected: expected.clone(),
					got: got.into(),
				});
			}
		}
	}

	check_state(&test.expect, &executor.into_state())
}

fn check_result(expect: &Expectation, result: &ExecutionResult) -> Result<(), TestError> {
	if result.failed != expect.failed {
		return Err(TestError::FailedFlag {
			expected: expect.failed,
			got: result.failed,
		});
	}

	if let Some(expected) = expect.used_gas {
		if result.used_gas != expected {
			return Err(TestError::UsedGas {
				expected,
				got: result.used_gas,
			});
		}
	}

	if let Some(expected) = &expect.return_value {
		if result.return_value != expected.0 {
			return Err(TestError::ReturnValue {
				expected: hex::encode(&expected.0),
				got: hex::encode(&result.return_value),
			});
		}
	}

	Ok(())
}

fn check_state(expect: &Expectation, state: &MemoryState) -> Result<(), TestError> {
	for (address, expected) in &expect.post {
		let Some(actual) = state.account(*address) else {
			return Err(TestError::MissingAccount(*address));
		};

		let mismatch = |field| TestError::AccountMismatch {
			address: *address,
			field,
		};
		if actual.balance != expected.balance {
			return Err(mismatch("balance"));
		}
		if actual.nonce != expected.nonce {
			return Err(mismatch("nonce"));
		}
		if actual.code != expected.code.0 {
			return Err(mismatch("code"));
		}
		if actual.storage != expected.storage() {
			return Err(mismatch("storage"));
		}
	}

	for address in &expect.absent {
		if state.account(*address).is_some() {
			return Err(TestError::UnexpectedAccount(*address));
		}
	}

	Ok(())
}

/// Run every test of a fixture file.
///
/// # Errors
/// Return an error if the file cannot be read or parsed
pub fn run_file(path: &Path) -> anyhow::Result<FileOutcome> {
	let content = fs::read_to_string(path)?;
	let tests: BTreeMap<String, StateTest> = serde_json::from_str(&content)?;

	Ok(tests
		.into_iter()
		.map(|(name, test)| {
			log::debug!("running {name}");
			let outcome = run_test(&test);
			(name, outcome)
		})
		.collect())
}

/// Every `.json` file under `path`, `path` itself if it is a file.
///
/// # Errors
/// Return an error if a directory cannot be read
pub fn fixture_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
	if path.is_file() {
		return Ok(vec![path.to_path_buf()]);
	}

	let mut files = Vec::new();
	for entry in fs::read_dir(path)? {
		let entry = entry?.path();
		if entry.is_dir() {
			files.extend(fixture_files(&entry)?);
		} else if entry.extension().is_some_and(|ext| ext == "json") {
			files.push(entry);
		}
	}
	files.sort();
	Ok(files)
}
