//! JSON fixture format.
//!
//! A fixture file maps test names to [`StateTest`]s. Hashes, addresses and
//! 256-bit integers are `0x`-prefixed hex strings; nonces and gas amounts
//! are plain numbers.

use evm::backend::{MemoryAccount, Vicinity};
use evm::{Config, Message};
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// `0x`-prefixed hex byte string.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HexBytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for HexBytes {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		let digits = s.strip_prefix("0x").unwrap_or(&s);
		hex::decode(digits)
			.map(Self)
			.map_err(serde::de::Error::custom)
	}
}

/// Rule set a test runs under.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum ForkName {
	Frontier,
	Homestead,
}

impl ForkName {
	#[must_use]
	pub const fn config(self) -> Config {
		match self {
			Self::Frontier => Config::frontier(),
			Self::Homestead => Config::homestead(),
		}
	}
}

/// Block environment.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Env {
	pub gas_price: U256,
	pub block_number: U256,
	pub coinbase: H160,
	pub timestamp: U256,
	pub difficulty: U256,
	pub block_gas_limit: U256,
	/// Gas left in the block's pool, the message's gas limit if absent.
	pub gas_pool: Option<u64>,
}

impl From<&Env> for Vicinity {
	fn from(env: &Env) -> Self {
		Self {
			gas_price: env.gas_price,
			block_hashes: Vec::new(),
			block_number: env.block_number,
			block_coinbase: env.coinbase,
			block_timestamp: env.timestamp,
			block_difficulty: env.difficulty,
			block_gas_limit: env.block_gas_limit,
		}
	}
}

/// Account of a pre or post state.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Account {
	pub balance: U256,
	pub nonce: u64,
	pub code: HexBytes,
	pub storage: BTreeMap<U256, U256>,
}

impl Account {
	/// Storage with zero values dropped, keyed the way the world state
	/// keys it.
	#[must_use]
	pub fn storage(&self) -> BTreeMap<H256, H256> {
		self.storage
			.iter()
			.filter(|(_, value)| !value.is_zero())
			.map(|(index, value)| (u256_to_h256(*index), u256_to_h256(*value)))
			.collect()
	}
}

impl From<&Account> for MemoryAccount {
	fn from(account: &Account) -> Self {
		Self {
			nonce: account.nonce,
			balance: account.balance,
			storage: account.storage(),
			code: account.code.0.clone(),
		}
	}
}

/// The message to apply.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMessage {
	pub from: H160,
	#[serde(default)]
	pub to: Option<H160>,
	#[serde(default)]
	pub value: U256,
	#[serde(default)]
	pub nonce: u64,
	#[serde(default = "default_check_nonce")]
	pub check_nonce: bool,
	#[serde(default)]
	pub data: HexBytes,
	pub gas_limit: u64,
}

const fn default_check_nonce() -> bool {
	true
}

impl From<&TestMessage> for Message {
	fn from(message: &TestMessage) -> Self {
		Self {
			from: message.from,
			to: message.to,
			value: message.value,
			nonce: message.nonce,
			check_nonce: message.check_nonce,
			data: message.data.0.clone(),
			gas_limit: message.gas_limit,
		}
	}
}

/// What applying the message must produce.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expectation {
	/// Name of the `TransitionError` variant the message is rejected with.
	pub rejected: Option<String>,
	pub failed: bool,
	pub used_gas: Option<u64>,
	pub return_value: Option<HexBytes>,
	/// Accounts that must exist, with their expected content.
	pub post: BTreeMap<H160, Account>,
	/// Accounts that must not exist.
	pub absent: Vec<H160>,
}

/// One state test.
#[derive(Clone, Debug, Deserialize)]
pub struct StateTest {
	pub fork: ForkName,
	#[serde(default)]
	pub env: Env,
	pub pre: BTreeMap<H160, Account>,
	pub message: TestMessage,
	pub expect: Expectation,
}

fn u256_to_h256(value: U256) -> H256 {
	let mut bytes = [0u8; 32];
	value.to_big_endian(&mut bytes);
	H256(bytes)
}
