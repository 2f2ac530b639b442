#![allow(clippy::module_name_repetitions)]

use crate::prelude::*;
use crate::{
	Context, CreateScheme, ExitError, ExitReason, ExitSucceed, Handler, Machine, Opcode, Transfer,
};
use alloc::collections::BTreeMap;
use primitive_types::{H160, H256, U256};

/// Handler that records every charged instruction and fails with
/// `OutOfGas` once `budget` instructions were charged.
pub struct MockHandler {
	pub is_static: bool,
	pub budget: usize,
	pub charged: Vec<(Opcode, Option<usize>)>,
	pub storage: BTreeMap<(H160, H256), H256>,
	pub calls: usize,
}

impl Default for MockHandler {
	fn default() -> Self {
		Self {
			is_static: false,
			budget: usize::MAX,
			charged: Vec::new(),
			storage: BTreeMap::new(),
			calls: 0,
		}
	}
}

impl Handler for MockHandler {
	fn balance(&self, _address: H160) -> U256 {
		U256::zero()
	}
	fn code_size(&self, _address: H160) -> U256 {
		U256::zero()
	}
	fn code(&self, _address: H160) -> Vec<u8> {
		Vec::new()
	}
	fn storage(&self, address: H160, index: H256) -> H256 {
		self.storage
			.get(&(address, index))
			.copied()
			.unwrap_or_default()
	}
	fn exists(&self, _address: H160) -> bool {
		true
	}
	fn deleted(&self, _address: H160) -> bool {
		false
	}
	fn gas_left(&self) -> U256 {
		U256::from(self.budget.saturating_sub(self.charged.len()))
	}
	fn gas_price(&self) -> U256 {
		U256::zero()
	}
	fn origin(&self) -> H160 {
		H160::default()
	}
	fn block_hash(&self, _number: U256) -> H256 {
		H256::default()
	}
	fn block_number(&self) -> U256 {
		U256::zero()
	}
	fn block_coinbase(&self) -> H160 {
		H160::default()
	}
	fn block_timestamp(&self) -> U256 {
		U256::zero()
	}
	fn block_difficulty(&self) -> U256 {
		U256::zero()
	}
	fn block_gas_limit(&self) -> U256 {
		U256::zero()
	}
	fn is_static(&self) -> bool {
		self.is_static
	}
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.storage.insert((address, index), value);
		Ok(())
	}
	fn log(&mut self, _address: H160, _topics: Vec<H256>, _data: Vec<u8>) -> Result<(), ExitError> {
		Ok(())
	}
	fn mark_delete(&mut self, _address: H160, _target: H160) -> Result<(), ExitError> {
		Ok(())
	}
	fn create(
		&mut self,
		_caller: H160,
		_scheme: CreateScheme,
		_value: U256,
		_init_code: Vec<u8>,
		_target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		(ExitError::OutOfFund.into(), None, Vec::new())
	}
	fn call(
		&mut self,
		_code_address: H160,
		_transfer: Option<Transfer>,
		_input: Vec<u8>,
		_target_gas: Option<u64>,
		_context: Context,
	) -> (ExitReason, Vec<u8>) {
		self.calls += 1;
		(ExitSucceed::Returned.into(), Vec::new())
	}
	fn before_bytecode(
		&mut self,
		opcode: Opcode,
		_pc: usize,
		_machine: &Machine,
		_address: &H160,
		memory_size: Option<usize>,
	) -> Result<(), ExitError> {
		if self.charged.len() >= self.budget {
			return Err(ExitError::OutOfGas);
		}
		self.charged.push((opcode, memory_size));
		Ok(())
	}
}
