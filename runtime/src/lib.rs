//! Runtime layer for the homestead-evm interpreter: instruction sets, opcode
//! behaviours and the execution loop of a single frame.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {
		use crate::tracing::Event::*;
		crate::tracing::with(|listener| listener.event($x));
	};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

mod config;
mod context;
mod eval;
mod handler;
pub mod instructions;

pub use evm_core::*;

pub use crate::config::{Config, Fork};
pub use crate::context::{CallScheme, Context, CreateScheme, Transfer};
pub use crate::eval::Control;
pub use crate::handler::Handler;
pub use crate::instructions::{
	ExecuteFn, InstructionSet, MemorySizeFn, Operation, FRONTIER_INSTRUCTION_SET,
	HOMESTEAD_INSTRUCTION_SET,
};

use crate::prelude::*;
use crate::utils::U64_MAX;
use primitive_types::U256;

mod prelude {
	pub use alloc::{rc::Rc, vec::Vec};
}

/// EVM runtime: one frame's machine plus the context it runs in.
///
/// The runtime is driven by [`Runtime::run`], which executes instructions
/// from the given [`InstructionSet`] until the frame exits. Everything
/// outside the frame, gas included, is reached through a [`Handler`].
#[derive(Clone, Debug)]
pub struct Runtime {
	pub(crate) machine: Machine,
	pub(crate) context: Context,
}

impl Runtime {
	/// Create a new runtime with given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		context: Context,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		Self {
			machine: Machine::new(code, data, stack_limit, memory_limit),
			context,
		}
	}

	/// Get a reference to the machine.
	#[must_use]
	pub const fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Get a mutable reference to the machine.
	pub fn machine_mut(&mut self) -> &mut Machine {
		&mut self.machine
	}

	/// Get a reference to the execution context.
	#[must_use]
	pub const fn context(&self) -> &Context {
		&self.context
	}

	/// Execute until the frame exits.
	pub fn run(&mut self, instructions: &InstructionSet, handler: &mut dyn Handler) -> ExitReason {
		loop {
			if let Err(reason) = self.step(instructions, handler) {
				return reason;
			}
		}
	}

	/// Execute a single instruction.
	///
	/// The instruction is first checked against the instruction set, the
	/// stack and the frame's write protection. Only then is the handler
	/// asked to charge for it, and only once the charge succeeded does the
	/// behaviour run.
	///
	/// # Errors
	/// Return the `ExitReason` once the frame exits
	pub fn step(
		&mut self,
		instructions: &InstructionSet,
		handler: &mut dyn Handler,
	) -> Result<(), ExitReason> {
		let Some(opcode) = self.machine.opcode() else {
			return Err(ExitSucceed::Stopped.into());
		};
		let position = self.machine.position();
		let operation = instructions.get(opcode);

		if !operation.valid {
			return Err(ExitError::InvalidCode(opcode).into());
		}
		operation.validate_stack(self.machine.stack())?;
		if handler.is_static() && Self::is_write(opcode, operation, self.machine.stack())? {
			return Err(ExitError::WriteProtection.into());
		}

		let memory_size = match operation.memory_size {
			Some(memory_size) => word_aligned_end(memory_size(self.machine.stack())?)?,
			None => None,
		};

		handler.before_bytecode(
			opcode,
			position,
			&self.machine,
			&self.context.address,
			memory_size,
		)?;
		if let Some(end) = memory_size {
			self.machine.memory_mut().resize_end(end)?;
		}

		event!(Step {
			address: self.context.address,
			opcode,
			position,
			stack: self.machine.stack(),
			memory: self.machine.memory()
		});

		let result = match (operation.execute)(self, handler) {
			Control::Continue if operation.halts => Err(ExitSucceed::Stopped.into()),
			Control::Continue => {
				if !operation.jumps {
					self.machine.advance(1 + opcode.push_width());
				}
				Ok(())
			}
			Control::Halt(_) if operation.reverts => Err(ExitRevert::Reverted.into()),
			Control::Halt(succeed) => Err(succeed.into()),
			Control::Exit(reason) => Err(reason),
		};

		event!(StepResult {
			result: &result,
			return_value: &self.machine.return_value()
		});

		result
	}

	fn is_write(opcode: Opcode, operation: &Operation, stack: &Stack) -> Result<bool, ExitError> {
		if operation.writes {
			return Ok(true);
		}
		if opcode == Opcode::CALL {
			return Ok(!stack.peek(2)?.is_zero());
		}
		Ok(false)
	}
}

/// Round the end of an accessed memory region up to a whole word.
fn word_aligned_end(end: Option<U256>) -> Result<Option<usize>, ExitError> {
	let Some(end) = end else {
		return Ok(None);
	};
	if end > U64_MAX {
		return Err(ExitError::GasUintOverflow);
	}

	let end = end.as_u64();
	let words = end / 32 + u64::from(end % 32 != 0);
	let aligned = words.checked_mul(32).ok_or(ExitError::GasUintOverflow)?;
	usize::try_from(aligned)
		.map(Some)
		.map_err(|_| ExitError::GasUintOverflow)
}

#[cfg(test)]
mod mock;

#[cfg(test)]
mod tests {
	use super::mock::MockHandler;
	use super::*;
	use primitive_types::H160;

	fn new_runtime(code: &str) -> Runtime {
		Runtime::new(
			Rc::new(hex::decode(code).unwrap()),
			Rc::new(Vec::new()),
			Context {
				address: H160::repeat_byte(0xaa),
				caller: H160::repeat_byte(0xbb),
				apparent_value: U256::zero(),
			},
			1024,
			usize::MAX,
		)
	}

	fn run(code: &str, handler: &mut MockHandler) -> (ExitReason, Runtime) {
		let mut runtime = new_runtime(code);
		let reason = runtime.run(&HOMESTEAD_INSTRUCTION_SET, handler);
		(reason, runtime)
	}

	fn stay(_runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
		Control::Continue
	}

	#[test]
	fn returns_memory_range() {
		let mut handler = MockHandler::default();
		// 1 + 2, stored at 0 and returned as one word
		let (reason, runtime) = run("600160020160005260206000f3", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
		assert_eq!(U256::from_big_endian(&runtime.machine().return_value()), U256::from(3));
		assert_eq!(handler.charged.len(), 8);
	}

	#[test]
	fn end_of_code_stops() {
		let mut handler = MockHandler::default();
		let (reason, _) = run("600160020100", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

		let (reason, _) = run("", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	}

	#[test]
	fn stack_underflow_is_not_charged() {
		let mut handler = MockHandler::default();
		let (reason, _) = run("600101", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::StackUnderflow));
		assert_eq!(handler.charged, vec![(Opcode::PUSH1, None)]);
	}

	#[test]
	fn invalid_opcodes_are_not_charged() {
		let mut handler = MockHandler::default();
		let (reason, _) = run("fe", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::InvalidCode(Opcode::INVALID)));

		let (reason, _) = run("0c", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::InvalidCode(Opcode(0x0c))));
		assert!(handler.charged.is_empty());
	}

	#[test]
	fn frontier_rejects_delegatecall() {
		let mut handler = MockHandler::default();
		let mut runtime = new_runtime("600060006000600060006000f4");
		let reason = runtime.run(&FRONTIER_INSTRUCTION_SET, &mut handler);
		assert_eq!(
			reason,
			ExitReason::Error(ExitError::InvalidCode(Opcode::DELEGATECALL))
		);
		assert_eq!(handler.calls, 0);

		let mut runtime = new_runtime("600060006000600060006000f4");
		let reason = runtime.run(&HOMESTEAD_INSTRUCTION_SET, &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(handler.calls, 1);
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::one()));
	}

	#[test]
	fn static_frame_rejects_writes() {
		let mut handler = MockHandler {
			is_static: true,
			..MockHandler::default()
		};
		let (reason, _) = run("6001600055", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::WriteProtection));
		assert!(handler.storage.is_empty());
		// the rejected SSTORE is never charged
		assert_eq!(handler.charged.len(), 2);
	}

	#[test]
	fn static_frame_rejects_value_calls_only() {
		let mut handler = MockHandler {
			is_static: true,
			..MockHandler::default()
		};
		// CALL with value 1
		let (reason, _) = run("60006000600060006001600060fff1", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::WriteProtection));
		assert_eq!(handler.calls, 0);

		// CALL with value 0
		let (reason, _) = run("60006000600060006000600060fff1", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(handler.calls, 1);
	}

	#[test]
	fn truncated_push_reads_zeros() {
		let mut handler = MockHandler::default();
		let (reason, runtime) = run("6101", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(0x0100)));
	}

	#[test]
	fn jumps_need_a_jumpdest_outside_push_data() {
		let mut handler = MockHandler::default();
		let (reason, runtime) = run("6004565b", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::InvalidJump));
		assert_eq!(runtime.machine().position(), 2);

		let (reason, _) = run("600456605b", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::InvalidJump));

		let (reason, runtime) = run("6003565b6001", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::one()));
	}

	#[test]
	fn jumpi_falls_through_on_zero() {
		let mut handler = MockHandler::default();
		let (reason, runtime) = run("6000600057602a", &mut handler);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(42)));
	}

	#[test]
	fn memory_size_is_word_aligned() {
		let mut handler = MockHandler::default();
		let (_, runtime) = run("600160215300", &mut handler);
		assert_eq!(handler.charged[2], (Opcode::MSTORE8, Some(64)));
		assert_eq!(runtime.machine().memory().effective_len(), 64);
	}

	#[test]
	fn oversized_memory_access_overflows_gas() {
		let mut handler = MockHandler::default();
		let (reason, _) = run("67ffffffffffffffff51", &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::GasUintOverflow));

		let code = format!("7f{}51", "ff".repeat(32));
		let (reason, _) = run(&code, &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::GasUintOverflow));
	}

	#[test]
	fn reverting_overlay() {
		let set = InstructionSet::overlay(
			&HOMESTEAD_INSTRUCTION_SET,
			&[(
				Opcode(0xfd),
				Operation::new(eval::ret, 2, 0)
					.with_memory(instructions::memory::ret)
					.reverting(),
			)],
		);
		let mut handler = MockHandler::default();
		let mut runtime = new_runtime("602a60005260206000fd");
		let reason = runtime.run(&set, &mut handler);
		assert_eq!(reason, ExitReason::Revert(ExitRevert::Reverted));
		assert_eq!(
			U256::from_big_endian(&runtime.machine().return_value()),
			U256::from(42)
		);
	}

	#[test]
	fn jumping_operation_owns_the_program_counter() {
		let set = InstructionSet::overlay(
			&HOMESTEAD_INSTRUCTION_SET,
			&[(Opcode(0x0c), Operation::new(stay, 0, 0).jumping())],
		);
		let mut handler = MockHandler {
			budget: 10,
			..MockHandler::default()
		};
		let mut runtime = new_runtime("0c");
		let reason = runtime.run(&set, &mut handler);
		assert_eq!(reason, ExitReason::Error(ExitError::OutOfGas));
		assert_eq!(runtime.machine().position(), 0);
		assert_eq!(handler.charged.len(), 10);
	}
}
