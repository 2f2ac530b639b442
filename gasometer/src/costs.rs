use crate::consts::{
	G_CALLVALUE, G_COPY, G_CREATE, G_EXP, G_LOG, G_LOGDATA, G_LOGTOPIC, G_MEMORY, G_NEWACCOUNT,
	G_QUADCOEFFDIV, G_SHA3, G_SHA3WORD, G_VERYLOW, R_SUICIDE,
};
use evm_core::utils::U64_MAX;
use evm_core::ExitError;
use evm_runtime::Config;
use primitive_types::{H256, U256};

/// Number of 32-byte words needed to hold `len` bytes.
fn words(len: U256) -> Result<u64, ExitError> {
	if len > U64_MAX {
		return Err(ExitError::GasUintOverflow);
	}
	let len = len.as_u64();
	Ok(len / 32 + u64::from(len % 32 != 0))
}

fn per_word(base: u64, word_cost: u64, len: U256) -> Result<u64, ExitError> {
	words(len)?
		.checked_mul(word_cost)
		.and_then(|cost| cost.checked_add(base))
		.ok_or(ExitError::GasUintOverflow)
}

pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitError> {
	if power.is_zero() {
		return Ok(G_EXP);
	}

	let bytes = power.bits().div_ceil(8) as u64;
	config
		.gas_expbyte
		.checked_mul(bytes)
		.and_then(|cost| cost.checked_add(G_EXP))
		.ok_or(ExitError::GasUintOverflow)
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	per_word(G_SHA3, G_SHA3WORD, len)
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitError> {
	per_word(G_VERYLOW, G_COPY, len)
}

pub fn extcodecopy_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	per_word(config.gas_ext_code, G_COPY, len)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	if len > U64_MAX {
		return Err(ExitError::GasUintOverflow);
	}

	len.as_u64()
		.checked_mul(G_LOGDATA)
		.and_then(|cost| cost.checked_add(G_LOG))
		.and_then(|cost| cost.checked_add(G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitError::GasUintOverflow)
}

pub fn sstore_cost(current: H256, new: H256, config: &Config) -> u64 {
	if current == H256::zero() && new != H256::zero() {
		config.gas_sstore_set
	} else {
		config.gas_sstore_reset
	}
}

pub fn sstore_refund(current: H256, new: H256, config: &Config) -> i64 {
	if current != H256::zero() && new == H256::zero() {
		config.refund_sstore_clears
	} else {
		0
	}
}

pub const fn create_cost() -> u64 {
	G_CREATE
}

/// Base cost of the call family. The forwarded gas is charged separately
/// when the child frame is entered.
pub fn call_cost(value: U256, is_call_or_callcode: bool, new_account: bool, config: &Config) -> u64 {
	let mut cost = config.gas_call;
	if is_call_or_callcode && !value.is_zero() {
		cost += G_CALLVALUE;
	}
	if new_account {
		cost += G_NEWACCOUNT;
	}
	cost
}

pub const fn suicide_cost(config: &Config) -> u64 {
	config.gas_suicide
}

pub const fn suicide_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		R_SUICIDE
	}
}

/// Total gas paid for a memory of `words` words.
pub fn memory_gas(words: u64) -> Result<u64, ExitError> {
	let linear = words
		.checked_mul(G_MEMORY)
		.ok_or(ExitError::GasUintOverflow)?;
	let quadratic = words
		.checked_mul(words)
		.ok_or(ExitError::GasUintOverflow)?
		/ G_QUADCOEFFDIV;
	linear
		.checked_add(quadratic)
		.ok_or(ExitError::GasUintOverflow)
}
