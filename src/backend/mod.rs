//! # World state
//!
//! The executor and the message orchestrator read and mutate accounts only
//! through [`WorldState`]. The storage engine behind it is up to the
//! embedder; [`MemoryState`] is a journaled in-memory implementation.

mod memory;

pub use self::memory::{MemoryAccount, MemoryState};

use crate::prelude::*;
use ethereum::Log;
use primitive_types::{H160, H256, U256};
#[cfg(feature = "with-codec")]
use scale_codec::{Decode, Encode};
#[cfg(feature = "with-codec")]
use scale_info::TypeInfo;
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Block and transaction environment a message is applied in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-codec", derive(Encode, Decode, TypeInfo))]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Vicinity {
	/// Gas price.
	pub gas_price: U256,
	/// Hashes of the previous blocks, oldest first. The last entry is the
	/// hash of block `block_number - 1`.
	pub block_hashes: Vec<H256>,
	/// Block number.
	pub block_number: U256,
	/// Block coinbase.
	pub block_coinbase: H160,
	/// Block timestamp.
	pub block_timestamp: U256,
	/// Block difficulty.
	pub block_difficulty: U256,
	/// Block gas limit.
	pub block_gas_limit: U256,
}

impl Vicinity {
	/// Hash of block `number`, zero outside of the last 256 blocks.
	#[must_use]
	pub fn block_hash(&self, number: U256) -> H256 {
		if number >= self.block_number
			|| self.block_number - number - U256::one() >= U256::from(self.block_hashes.len())
			|| self.block_number - number > U256::from(256)
		{
			return H256::default();
		}

		let index = (self.block_number - number - U256::one()).as_usize();
		self.block_hashes[self.block_hashes.len() - index - 1]
	}
}

/// Account ledger capability.
///
/// Mutations are journaled: [`WorldState::snapshot`] returns a marker that
/// [`WorldState::revert_to_snapshot`] rolls every later mutation back to.
#[auto_impl::auto_impl(&mut, Box)]
pub trait WorldState {
	/// Whether an account exists at `address`.
	fn exists(&self, address: H160) -> bool;
	/// Create an account at `address`. Balance and nonce of an existing
	/// account are kept; code and storage are cleared.
	fn create_account(&mut self, address: H160);

	/// Nonce of `address`, zero if absent.
	fn nonce(&self, address: H160) -> u64;
	/// Set the nonce of `address`, creating the account if needed.
	fn set_nonce(&mut self, address: H160, nonce: u64);

	/// Balance of `address`, zero if absent.
	fn balance(&self, address: H160) -> U256;
	/// Credit `address`, creating the account if needed.
	fn add_balance(&mut self, address: H160, value: U256);
	/// Debit `address`. The caller checks the balance first.
	fn sub_balance(&mut self, address: H160, value: U256);

	/// Code of `address`, empty if absent.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Code size of `address`.
	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.code(address).len())
	}
	/// Set the code of `address`.
	fn set_code(&mut self, address: H160, code: Vec<u8>);

	/// Storage value of `address` at `index`, zero if absent.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Set the storage value of `address` at `index`.
	fn set_storage(&mut self, address: H160, index: H256, value: H256);

	/// Record a log entry.
	fn log(&mut self, log: Log);

	/// Mark `address` as self-destructed and zero its balance.
	fn suicide(&mut self, address: H160);
	/// Whether `address` has been marked as self-destructed.
	fn has_suicided(&self, address: H160) -> bool;

	/// Marker of the current state.
	fn snapshot(&mut self) -> usize;
	/// Undo every mutation made after `snapshot` was taken.
	fn revert_to_snapshot(&mut self, snapshot: usize);

	/// Apply pending self-destructs and drop the journal. Called once a
	/// message has been fully applied.
	fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn block_hash_window() {
		let vicinity = Vicinity {
			block_number: U256::from(300),
			block_hashes: (0..300u64).map(H256::from_low_u64_be).collect(),
			..Vicinity::default()
		};

		assert_eq!(vicinity.block_hash(U256::from(299)), H256::from_low_u64_be(299));
		assert_eq!(vicinity.block_hash(U256::from(44)), H256::from_low_u64_be(44));
		assert_eq!(vicinity.block_hash(U256::from(43)), H256::zero());
		assert_eq!(vicinity.block_hash(U256::from(300)), H256::zero());
		assert_eq!(vicinity.block_hash(U256::MAX), H256::zero());
	}

	#[test]
	fn missing_block_hashes_are_zero() {
		let vicinity = Vicinity {
			block_number: U256::from(10),
			block_hashes: vec![H256::repeat_byte(9)],
			..Vicinity::default()
		};

		assert_eq!(vicinity.block_hash(U256::from(9)), H256::repeat_byte(9));
		assert_eq!(vicinity.block_hash(U256::from(8)), H256::zero());
	}
}
