use crate::backend::{Vicinity, WorldState};
use crate::gasometer::{self, Gasometer};
use crate::prelude::*;
use crate::{
	Config, Context, CreateScheme, ExitError, ExitReason, Handler, InstructionSet, Machine, Opcode,
	Runtime, Transfer,
};
use core::cmp::min;
use ethereum::Log;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

macro_rules! emit_exit {
	($reason:expr) => {{
		let reason = $reason;
		event!(Exit {
			reason: &reason,
			return_value: &Vec::new(),
		});
		reason
	}};
	($reason:expr, $return_value:expr) => {{
		let reason = $reason;
		let return_value = $return_value;
		event!(Exit {
			reason: &reason,
			return_value: &return_value,
		});
		(reason, return_value)
	}};
}

/// How a nested frame ended, and therefore what happens to its substate.
pub enum StackExitKind {
	/// State changes are kept, unused gas and refunds go to the parent.
	Succeeded,
	/// State changes are rolled back, unused gas goes to the parent.
	Reverted,
	/// State changes are rolled back and all of the frame's gas is consumed.
	Failed,
}

/// Per-frame metadata: the frame's gasometer, its depth and whether it is
/// read-only.
#[derive(Clone, Debug)]
pub struct StackSubstateMetadata<'config> {
	gasometer: Gasometer<'config>,
	is_static: bool,
	depth: Option<usize>,
}

impl<'config> StackSubstateMetadata<'config> {
	#[must_use]
	pub const fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gasometer: Gasometer::new(gas_limit, config),
			is_static: false,
			depth: None,
		}
	}

	/// Merge a succeeded child: return its unused gas and keep its refunds.
	///
	/// # Errors
	/// Return `ExitError` that is thrown by gasometer gas calculation errors.
	pub fn swallow_commit(&mut self, other: &Self) -> Result<(), ExitError> {
		self.gasometer.record_stipend(other.gasometer.gas())?;
		self.gasometer.record_refund(other.gasometer.refunded_gas())
	}

	/// Merge a reverted child: return its unused gas only.
	///
	/// # Errors
	/// Return `ExitError` that is thrown by gasometer gas calculation errors.
	pub fn swallow_revert(&mut self, other: &Self) -> Result<(), ExitError> {
		self.gasometer.record_stipend(other.gasometer.gas())
	}

	/// A failed child gives nothing back.
	pub const fn swallow_discard(&self, _other: &Self) {}

	#[must_use]
	pub fn spit_child(&self, gas_limit: u64, is_static: bool) -> Self {
		Self {
			gasometer: Gasometer::new(gas_limit, self.gasometer.config()),
			is_static: is_static || self.is_static,
			depth: self.depth.map_or(Some(0), |n| Some(n + 1)),
		}
	}

	#[must_use]
	pub const fn gasometer(&self) -> &Gasometer<'config> {
		&self.gasometer
	}

	pub fn gasometer_mut(&mut self) -> &mut Gasometer<'config> {
		&mut self.gasometer
	}

	#[must_use]
	pub const fn is_static(&self) -> bool {
		self.is_static
	}

	#[must_use]
	pub const fn depth(&self) -> Option<usize> {
		self.depth
	}
}

/// Stack-based executor.
///
/// Nested frames are run by plain recursion: a `CALL` or `CREATE` in a frame
/// enters a substate, runs the child `Runtime` to completion with the
/// executor as its handler, and exits the substate according to the child's
/// outcome. Embedders running deep call chains need a thread stack sized
/// for `call_stack_limit` nested frames.
pub struct StackExecutor<'config, S> {
	config: &'config Config,
	instructions: &'config InstructionSet,
	vicinity: Vicinity,
	state: S,
	origin: H160,
	is_static: bool,
	metadata: StackSubstateMetadata<'config>,
	substates: Vec<(StackSubstateMetadata<'config>, usize)>,
}

impl<'config, S: WorldState> StackExecutor<'config, S> {
	/// Create a new stack-based executor running the instruction set of
	/// `config`'s fork.
	#[must_use]
	pub fn new(state: S, config: &'config Config, vicinity: Vicinity) -> Self {
		Self {
			config,
			instructions: config.instruction_set(),
			vicinity,
			state,
			origin: H160::default(),
			is_static: false,
			metadata: StackSubstateMetadata::new(0, config),
			substates: Vec::new(),
		}
	}

	/// Run a custom instruction set instead of the fork's.
	#[must_use]
	pub const fn with_instruction_set(mut self, instructions: &'config InstructionSet) -> Self {
		self.instructions = instructions;
		self
	}

	/// Return a reference of the Config.
	#[must_use]
	pub const fn config(&self) -> &'config Config {
		self.config
	}

	#[must_use]
	pub const fn vicinity(&self) -> &Vicinity {
		&self.vicinity
	}

	#[must_use]
	pub const fn state(&self) -> &S {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut S {
		&mut self.state
	}

	#[must_use]
	#[allow(clippy::missing_const_for_fn)]
	pub fn into_state(self) -> S {
		self.state
	}

	/// Run every following transaction in a read-only frame.
	pub fn set_static(&mut self, is_static: bool) {
		self.is_static = is_static;
	}

	/// Metadata of the frame currently running.
	#[must_use]
	pub const fn metadata(&self) -> &StackSubstateMetadata<'config> {
		&self.metadata
	}

	/// Remaining gas of the frame currently running.
	#[must_use]
	pub fn gas(&self) -> u64 {
		self.metadata.gasometer.gas()
	}

	/// Create a substate executor from the current executor.
	pub fn enter_substate(&mut self, gas_limit: u64, is_static: bool) {
		let child = self.metadata.spit_child(gas_limit, is_static);
		let parent = core::mem::replace(&mut self.metadata, child);
		let snapshot = self.state.snapshot();
		self.substates.push((parent, snapshot));
	}

	/// Exit a substate.
	///
	/// # Errors
	/// Return `ExitError` if there is no substate to exit, or if the parent
	/// gasometer rejects the merge.
	pub fn exit_substate(&mut self, kind: &StackExitKind) -> Result<(), ExitError> {
		let Some((parent, snapshot)) = self.substates.pop() else {
			return Err(ExitError::Other("no substate to exit".into()));
		};
		let child = core::mem::replace(&mut self.metadata, parent);

		match kind {
			StackExitKind::Succeeded => self.metadata.swallow_commit(&child),
			StackExitKind::Reverted => {
				self.state.revert_to_snapshot(snapshot);
				self.metadata.swallow_revert(&child)
			}
			StackExitKind::Failed => {
				self.state.revert_to_snapshot(snapshot);
				self.metadata.swallow_discard(&child);
				Ok(())
			}
		}
	}

	/// Execute the runtime until it returns.
	pub fn execute(&mut self, runtime: &mut Runtime) -> ExitReason {
		let instructions = self.instructions;
		runtime.run(instructions, self)
	}

	fn reset(&mut self, caller: H160, gas_limit: u64) {
		self.origin = caller;
		self.metadata = StackSubstateMetadata::new(gas_limit, self.config);
		self.metadata.is_static = self.is_static;
		self.substates.clear();
	}

	/// Execute a `CREATE` transaction. The sender's nonce is incremented by
	/// the creation itself.
	pub fn transact_create(
		&mut self,
		caller: H160,
		value: U256,
		init_code: Vec<u8>,
		gas_limit: u64,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		self.reset(caller, gas_limit);

		event!(TransactCreate {
			caller,
			value,
			init_code: &init_code,
			gas_limit,
			address: self.create_address(CreateScheme::Legacy { caller }),
		});

		let (reason, address, return_value) = self.create_inner(
			caller,
			CreateScheme::Legacy { caller },
			value,
			init_code,
			Some(gas_limit),
		);
		let (reason, return_value) = emit_exit!(reason, return_value);
		(reason, address, return_value)
	}

	/// Execute a `CALL` transaction. The sender's nonce is left to the
	/// caller.
	pub fn transact_call(
		&mut self,
		caller: H160,
		address: H160,
		value: U256,
		data: Vec<u8>,
		gas_limit: u64,
	) -> (ExitReason, Vec<u8>) {
		self.reset(caller, gas_limit);

		event!(TransactCall {
			caller,
			address,
			value,
			data: &data,
			gas_limit,
		});

		let context = Context {
			caller,
			address,
			apparent_value: value,
		};

		let (reason, return_value) = self.call_inner(
			address,
			Some(Transfer {
				source: caller,
				target: address,
				value,
			}),
			data,
			Some(gas_limit),
			false,
			context,
		);
		emit_exit!(reason, return_value)
	}

	/// Gas used by the last transaction, after refunds.
	#[must_use]
	pub fn used_gas(&self) -> u64 {
		let gasometer = &self.metadata.gasometer;
		let total_used_gas = gasometer.total_used_gas();
		// Avoid uncontrolled `u64` casting
		let refunded_gas = u64::try_from(gasometer.refunded_gas()).unwrap_or_default();
		total_used_gas - min(total_used_gas / self.config.max_refund_quotient, refunded_gas)
	}

	/// Get fee needed for the current executor, given the price.
	#[must_use]
	pub fn fee(&self, price: U256) -> U256 {
		U256::from(self.used_gas()).saturating_mul(price)
	}

	/// Get account nonce.
	#[must_use]
	pub fn nonce(&self, address: H160) -> u64 {
		self.state.nonce(address)
	}

	/// Whether creating a contract at `address` collides with an existing
	/// account.
	#[must_use]
	pub fn is_create_collision(&self, address: H160) -> bool {
		self.state.nonce(address) != 0 || !self.state.code_size(address).is_zero()
	}

	/// Get the created address from given scheme.
	#[must_use]
	pub fn create_address(&self, scheme: CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Legacy { caller } => {
				let nonce = self.state.nonce(caller);
				let mut stream = rlp::RlpStream::new_list(2);
				stream.append(&caller);
				stream.append(&nonce);
				H256::from_slice(Keccak256::digest(stream.out()).as_slice()).into()
			}
		}
	}

	fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError> {
		if self.state.balance(transfer.source) < transfer.value {
			return Err(ExitError::OutOfFund);
		}

		self.state.sub_balance(transfer.source, transfer.value);
		self.state.add_balance(transfer.target, transfer.value);
		Ok(())
	}

	fn create_inner(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		macro_rules! try_or_fail {
			( $e:expr ) => {
				match $e {
					Ok(v) => v,
					Err(e) => return (e.into(), None, Vec::new()),
				}
			};
		}

		let address = self.create_address(scheme);

		event!(Create {
			caller,
			address,
			scheme,
			value,
			init_code: &init_code,
			target_gas
		});

		if let Some(depth) = self.metadata.depth {
			// The init code would run at `depth + 1`.
			if depth + 1 > self.config.call_stack_limit {
				return (ExitError::CallTooDeep.into(), None, Vec::new());
			}
		}

		if self.state.balance(caller) < value {
			return (ExitError::OutOfFund.into(), None, Vec::new());
		}

		let Some(nonce) = self.state.nonce(caller).checked_add(1) else {
			return (ExitError::MaxNonce.into(), None, Vec::new());
		};

		let after_gas = self.metadata.gasometer.gas();
		let gas_limit = min(after_gas, target_gas.unwrap_or(after_gas));
		try_or_fail!(self.metadata.gasometer.record_cost(gas_limit));

		self.state.set_nonce(caller, nonce);
		self.enter_substate(gas_limit, false);

		if self.is_create_collision(address) {
			let _ = self.exit_substate(&StackExitKind::Failed);
			return (ExitError::CreateCollision.into(), None, Vec::new());
		}

		self.state.create_account(address);
		if let Err(e) = self.transfer(Transfer {
			source: caller,
			target: address,
			value,
		}) {
			let _ = self.exit_substate(&StackExitKind::Reverted);
			return (ExitReason::Error(e), None, Vec::new());
		}

		let mut runtime = Runtime::new(
			Rc::new(init_code),
			Rc::new(Vec::new()),
			Context {
				address,
				caller,
				apparent_value: value,
			},
			self.config.stack_limit,
			self.config.memory_limit,
		);

		let reason = self.execute(&mut runtime);
		let return_data = runtime.machine().return_value();
		self.cleanup_for_create(address, reason, return_data)
	}

	fn call_inner(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		take_stipend: bool,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		macro_rules! try_or_fail {
			( $e:expr ) => {
				match $e {
					Ok(v) => v,
					Err(e) => return (e.into(), Vec::new()),
				}
			};
		}

		event!(Call {
			code_address,
			transfer: &transfer,
			input: &input,
			target_gas,
			is_static: self.metadata.is_static,
			context: &context,
		});

		let after_gas = self.metadata.gasometer.gas();
		let target_gas = target_gas.unwrap_or(after_gas);
		let mut gas_limit = min(target_gas, after_gas);

		try_or_fail!(self.metadata.gasometer.record_cost(gas_limit));

		if let Some(transfer) = transfer.as_ref() {
			if take_stipend && transfer.value != U256::zero() {
				gas_limit = gas_limit.saturating_add(self.config.call_stipend);
			}
		}

		let code = self.state.code(code_address);

		self.enter_substate(gas_limit, false);

		if let Some(depth) = self.metadata.depth {
			if depth > self.config.call_stack_limit {
				let _ = self.exit_substate(&StackExitKind::Reverted);
				return (ExitError::CallTooDeep.into(), Vec::new());
			}
		}

		if !self.state.exists(context.address) {
			self.state.create_account(context.address);
		}

		if let Some(transfer) = transfer {
			if let Err(e) = self.transfer(transfer) {
				let _ = self.exit_substate(&StackExitKind::Reverted);
				return (ExitReason::Error(e), Vec::new());
			}
		}

		if code.is_empty() {
			let _ = self.exit_substate(&StackExitKind::Succeeded);
			return (crate::ExitSucceed::Stopped.into(), Vec::new());
		}

		let mut runtime = Runtime::new(
			Rc::new(code),
			Rc::new(input),
			context,
			self.config.stack_limit,
			self.config.memory_limit,
		);

		let reason = self.execute(&mut runtime);
		let return_data = runtime.machine().return_value();
		self.cleanup_for_call(code_address, reason, return_data)
	}

	fn cleanup_for_create(
		&mut self,
		created_address: H160,
		reason: ExitReason,
		return_data: Vec<u8>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		log::debug!(target: "evm", "Create execution using address {}: {:?}", created_address, reason);

		match reason {
			ExitReason::Succeed(s) => {
				match self
					.metadata
					.gasometer
					.record_deposit(return_data.len())
				{
					Ok(()) => {
						let exit_result = self.exit_substate(&StackExitKind::Succeeded);
						self.state.set_code(created_address, return_data.clone());
						if let Err(e) = exit_result {
							return (e.into(), None, Vec::new());
						}
						(ExitReason::Succeed(s), Some(created_address), return_data)
					}
					Err(e) if self.config.fail_on_code_deposit_oog => {
						self.metadata.gasometer.fail();
						let _ = self.exit_substate(&StackExitKind::Failed);
						(ExitReason::Error(e), None, Vec::new())
					}
					Err(_) => {
						if let Err(e) = self.exit_substate(&StackExitKind::Succeeded) {
							return (e.into(), None, Vec::new());
						}
						(
							ExitError::CodeStoreOutOfGas.into(),
							Some(created_address),
							Vec::new(),
						)
					}
				}
			}
			ExitReason::Error(e) => {
				self.metadata.gasometer.fail();
				let _ = self.exit_substate(&StackExitKind::Failed);
				(ExitReason::Error(e), None, Vec::new())
			}
			ExitReason::Revert(e) => {
				let _ = self.exit_substate(&StackExitKind::Reverted);
				(ExitReason::Revert(e), None, return_data)
			}
		}
	}

	fn cleanup_for_call(
		&mut self,
		code_address: H160,
		reason: ExitReason,
		return_data: Vec<u8>,
	) -> (ExitReason, Vec<u8>) {
		log::debug!(target: "evm", "Call execution using address {}: {:?}", code_address, reason);

		match reason {
			ExitReason::Succeed(_) => {
				if let Err(e) = self.exit_substate(&StackExitKind::Succeeded) {
					return (e.into(), Vec::new());
				}
				(reason, return_data)
			}
			ExitReason::Error(_) => {
				let _ = self.exit_substate(&StackExitKind::Failed);
				(reason, Vec::new())
			}
			ExitReason::Revert(_) => {
				let _ = self.exit_substate(&StackExitKind::Reverted);
				(reason, return_data)
			}
		}
	}
}

impl<'config, S: WorldState> Handler for StackExecutor<'config, S> {
	fn balance(&self, address: H160) -> U256 {
		self.state.balance(address)
	}

	fn code_size(&self, address: H160) -> U256 {
		self.state.code_size(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state.code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state.storage(address, index)
	}

	fn exists(&self, address: H160) -> bool {
		self.state.exists(address)
	}

	fn deleted(&self, address: H160) -> bool {
		self.state.has_suicided(address)
	}

	fn gas_left(&self) -> U256 {
		U256::from(self.metadata.gasometer.gas())
	}

	fn gas_price(&self) -> U256 {
		self.vicinity.gas_price
	}

	fn origin(&self) -> H160 {
		self.origin
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.vicinity.block_hash(number)
	}

	fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}

	fn block_coinbase(&self) -> H160 {
		self.vicinity.block_coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.vicinity.block_timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.vicinity.block_difficulty
	}

	fn block_gas_limit(&self) -> U256 {
		self.vicinity.block_gas_limit
	}

	fn is_static(&self) -> bool {
		self.metadata.is_static
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.state.set_storage(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		self.state.log(Log {
			address,
			topics,
			data,
		});
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.state.balance(address);

		event!(Suicide {
			target,
			address,
			balance,
		});

		self.transfer(Transfer {
			source: address,
			target,
			value: balance,
		})?;
		self.state.suicide(address);

		Ok(())
	}

	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		self.create_inner(caller, scheme, value, init_code, target_gas)
	}

	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		self.call_inner(code_address, transfer, input, target_gas, true, context)
	}

	#[inline]
	fn before_bytecode(
		&mut self,
		opcode: Opcode,
		_pc: usize,
		machine: &Machine,
		address: &H160,
		memory_size: Option<usize>,
	) -> Result<(), ExitError> {
		if let (Some(cost), None) = (gasometer::static_opcode_cost(opcode), memory_size) {
			return self.metadata.gasometer.record_cost(cost);
		}

		let gas_cost =
			gasometer::dynamic_opcode_cost(*address, opcode, machine.stack(), self.config, self)?;
		self.metadata
			.gasometer
			.record_dynamic_cost(gas_cost, memory_size)
	}
}
