use crate::prelude::*;
use crate::{Context, CreateScheme, ExitError, ExitReason, Machine, Opcode, Transfer};
use primitive_types::{H160, H256, U256};

/// EVM context handler.
///
/// The execution loop only ever talks to the outside world through this
/// trait: account and block queries, state mutations, nested frames and the
/// per-instruction gas charge. The trait is object safe so that opcode
/// behaviours can be plain function pointers over `&mut dyn Handler`.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Handler {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get code size of address.
	fn code_size(&self, address: H160) -> U256;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;
	/// Check whether an address has already been deleted.
	fn deleted(&self, address: H160) -> bool;

	/// Get the gas left value of the current frame.
	fn gas_left(&self) -> U256;
	/// Get the gas price value.
	fn gas_price(&self) -> U256;
	/// Get execution origin.
	fn origin(&self) -> H160;
	/// Get environmental block hash.
	fn block_hash(&self, number: U256) -> H256;
	/// Get environmental block number.
	fn block_number(&self) -> U256;
	/// Get environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Get environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Get environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Get environmental gas limit.
	fn block_gas_limit(&self) -> U256;
	/// Whether the current frame is read-only.
	fn is_static(&self) -> bool;

	/// Set storage value of address at index.
	///
	/// # Errors
	/// Return `ExitError`
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	/// Create a log owned by address with given topics and data.
	///
	/// # Errors
	/// Return `ExitError`
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;
	/// Mark an address to be deleted, with funds transferred to target.
	///
	/// # Errors
	/// Return `ExitError`
	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError>;

	/// Run a nested creation frame to completion. Returns the exit reason,
	/// the created address on success, and the frame's return data.
	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>);

	/// Run a nested call frame to completion. Returns the exit reason and
	/// the frame's return data.
	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		context: Context,
	) -> (ExitReason, Vec<u8>);

	/// Pre-validation step called before executing each instruction, after
	/// the stack has been validated. Charges the instruction's gas,
	/// including the growth of memory to `memory_size` bytes.
	///
	/// # Errors
	/// Return `ExitError`
	fn before_bytecode(
		&mut self,
		opcode: Opcode,
		pc: usize,
		machine: &Machine,
		address: &H160,
		memory_size: Option<usize>,
	) -> Result<(), ExitError>;
}
