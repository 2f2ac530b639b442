use super::WorldState;
use crate::prelude::*;
use ethereum::Log;
use primitive_types::{H160, H256, U256};
#[cfg(feature = "with-codec")]
use scale_codec::{Decode, Encode};
#[cfg(feature = "with-codec")]
use scale_info::TypeInfo;
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Account information of a memory state.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-codec", derive(Encode, Decode, TypeInfo))]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: u64,
	/// Account balance.
	pub balance: U256,
	/// Full account storage. Zero values are never stored.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

#[derive(Clone, Debug)]
enum JournalEntry {
	Created {
		address: H160,
		previous: Option<MemoryAccount>,
	},
	Nonce {
		address: H160,
		previous: u64,
	},
	Balance {
		address: H160,
		previous: U256,
	},
	Code {
		address: H160,
		previous: Vec<u8>,
	},
	Storage {
		address: H160,
		index: H256,
		previous: Option<H256>,
	},
	Log,
	Suicide {
		address: H160,
		was_suicided: bool,
		balance: U256,
	},
}

/// Journaled in-memory world state.
///
/// Accounts are kept in a `BTreeMap` so that iteration, and therefore any
/// state dump, is deterministic.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
	accounts: BTreeMap<H160, MemoryAccount>,
	suicided: BTreeSet<H160>,
	logs: Vec<Log>,
	journal: Vec<JournalEntry>,
}

impl MemoryState {
	/// Create a new memory state from the given accounts.
	#[must_use]
	pub fn new(accounts: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			accounts,
			..Self::default()
		}
	}

	/// All accounts.
	#[must_use]
	pub const fn accounts(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.accounts
	}

	/// Account at `address`, if any.
	#[must_use]
	pub fn account(&self, address: H160) -> Option<&MemoryAccount> {
		self.accounts.get(&address)
	}

	/// Logs emitted so far.
	#[must_use]
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	/// Drain the emitted logs.
	pub fn take_logs(&mut self) -> Vec<Log> {
		core::mem::take(&mut self.logs)
	}

	fn account_mut(&mut self, address: H160) -> &mut MemoryAccount {
		if !self.accounts.contains_key(&address) {
			self.journal.push(JournalEntry::Created {
				address,
				previous: None,
			});
		}
		self.accounts.entry(address).or_default()
	}

	fn undo(&mut self, entry: JournalEntry) {
		match entry {
			JournalEntry::Created { address, previous } => match previous {
				Some(account) => {
					self.accounts.insert(address, account);
				}
				None => {
					self.accounts.remove(&address);
				}
			},
			JournalEntry::Nonce { address, previous } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.nonce = previous;
				}
			}
			JournalEntry::Balance { address, previous } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.balance = previous;
				}
			}
			JournalEntry::Code { address, previous } => {
				if let Some(account) = self.accounts.get_mut(&address) {
					account.code = previous;
				}
			}
			JournalEntry::Storage {
				address,
				index,
				previous,
			} => {
				if let Some(account) = self.accounts.get_mut(&address) {
					match previous {
						Some(value) => account.storage.insert(index, value),
						None => account.storage.remove(&index),
					};
				}
			}
			JournalEntry::Log => {
				self.logs.pop();
			}
			JournalEntry::Suicide {
				address,
				was_suicided,
				balance,
			} => {
				if !was_suicided {
					self.suicided.remove(&address);
				}
				if let Some(account) = self.accounts.get_mut(&address) {
					account.balance = balance;
				}
			}
		}
	}
}

impl WorldState for MemoryState {
	fn exists(&self, address: H160) -> bool {
		self.accounts.contains_key(&address)
	}

	fn create_account(&mut self, address: H160) {
		let previous = self.accounts.get(&address).cloned();
		let account = match &previous {
			Some(existing) => MemoryAccount {
				nonce: existing.nonce,
				balance: existing.balance,
				..MemoryAccount::default()
			},
			None => MemoryAccount::default(),
		};

		self.journal.push(JournalEntry::Created { address, previous });
		self.accounts.insert(address, account);
	}

	fn nonce(&self, address: H160) -> u64 {
		self.accounts.get(&address).map_or(0, |a| a.nonce)
	}

	fn set_nonce(&mut self, address: H160, nonce: u64) {
		let account = self.account_mut(address);
		let previous = core::mem::replace(&mut account.nonce, nonce);
		self.journal.push(JournalEntry::Nonce { address, previous });
	}

	fn balance(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map_or_else(U256::zero, |a| a.balance)
	}

	fn add_balance(&mut self, address: H160, value: U256) {
		let account = self.account_mut(address);
		let previous = account.balance;
		account.balance = previous.saturating_add(value);
		self.journal.push(JournalEntry::Balance { address, previous });
	}

	fn sub_balance(&mut self, address: H160, value: U256) {
		let account = self.account_mut(address);
		let previous = account.balance;
		account.balance = previous.saturating_sub(value);
		self.journal.push(JournalEntry::Balance { address, previous });
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.accounts
			.get(&address)
			.map(|a| a.code.clone())
			.unwrap_or_default()
	}

	fn code_size(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map_or_else(U256::zero, |a| U256::from(a.code.len()))
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		let account = self.account_mut(address);
		let previous = core::mem::replace(&mut account.code, code);
		self.journal.push(JournalEntry::Code { address, previous });
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|a| a.storage.get(&index).copied())
			.unwrap_or_default()
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		let account = self.account_mut(address);
		let previous = if value == H256::zero() {
			account.storage.remove(&index)
		} else {
			account.storage.insert(index, value)
		};
		self.journal.push(JournalEntry::Storage {
			address,
			index,
			previous,
		});
	}

	fn log(&mut self, log: Log) {
		self.logs.push(log);
		self.journal.push(JournalEntry::Log);
	}

	fn suicide(&mut self, address: H160) {
		let was_suicided = !self.suicided.insert(address);
		let balance = self.balance(address);
		if let Some(account) = self.accounts.get_mut(&address) {
			account.balance = U256::zero();
		}
		self.journal.push(JournalEntry::Suicide {
			address,
			was_suicided,
			balance,
		});
	}

	fn has_suicided(&self, address: H160) -> bool {
		self.suicided.contains(&address)
	}

	fn snapshot(&mut self) -> usize {
		self.journal.len()
	}

	fn revert_to_snapshot(&mut self, snapshot: usize) {
		while self.journal.len() > snapshot {
			if let Some(entry) = self.journal.pop() {
				self.undo(entry);
			}
		}
	}

	fn finalize(&mut self) {
		for address in core::mem::take(&mut self.suicided) {
			self.accounts.remove(&address);
		}
		self.journal.clear();
	}
}
