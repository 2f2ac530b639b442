//! Fork-versioned instruction sets.
//!
//! An [`InstructionSet`] maps every one of the 256 opcode values to an
//! [`Operation`] descriptor. Sets are built at compile time and stored in
//! statics; a later fork is expressed as an overlay of the previous one, so
//! no published set is ever mutated.

pub mod memory;

use crate::eval::{self, Control};
use crate::{ExitError, Handler, Opcode, Runtime, Stack};
use core::fmt;
use primitive_types::U256;

/// Behaviour of an operation.
pub type ExecuteFn = fn(&mut Runtime, &mut dyn Handler) -> Control;

/// Memory requirement of an operation: the end offset of the region it
/// accesses, or `None` when it accesses no memory.
pub type MemorySizeFn = fn(&Stack) -> Result<Option<U256>, ExitError>;

/// Descriptor of a single opcode within an instruction set.
#[derive(Clone, Copy)]
pub struct Operation {
	/// Behaviour function.
	pub execute: ExecuteFn,
	/// Number of stack items consumed.
	pub pop: usize,
	/// Number of stack items produced.
	pub push: usize,
	/// Memory requirement, for operations that touch memory.
	pub memory_size: Option<MemorySizeFn>,
	/// The operation terminates the frame.
	pub halts: bool,
	/// The operation sets the program counter itself.
	pub jumps: bool,
	/// The operation modifies state and is rejected in a read-only frame.
	pub writes: bool,
	/// Halting through this operation reverts the frame.
	pub reverts: bool,
	/// The opcode is part of the instruction set.
	pub valid: bool,
}

impl Operation {
	/// Descriptor of every opcode outside the instruction set.
	pub const INVALID: Self = Self {
		execute: eval::invalid,
		pop: 0,
		push: 0,
		memory_size: None,
		halts: false,
		jumps: false,
		writes: false,
		reverts: false,
		valid: false,
	};

	/// A valid operation with the given behaviour and stack requirement.
	#[must_use]
	pub const fn new(execute: ExecuteFn, pop: usize, push: usize) -> Self {
		Self {
			execute,
			pop,
			push,
			memory_size: None,
			halts: false,
			jumps: false,
			writes: false,
			reverts: false,
			valid: true,
		}
	}

	#[must_use]
	pub const fn with_memory(mut self, memory_size: MemorySizeFn) -> Self {
		self.memory_size = Some(memory_size);
		self
	}

	#[must_use]
	pub const fn halting(mut self) -> Self {
		self.halts = true;
		self
	}

	#[must_use]
	pub const fn jumping(mut self) -> Self {
		self.jumps = true;
		self
	}

	#[must_use]
	pub const fn writing(mut self) -> Self {
		self.writes = true;
		self
	}

	/// Mark the operation as halting with a revert.
	#[must_use]
	pub const fn reverting(mut self) -> Self {
		self.halts = true;
		self.reverts = true;
		self
	}

	/// Check the stack against the operation's requirement.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow` or `ExitError::StackOverflow`
	#[inline]
	pub fn validate_stack(&self, stack: &Stack) -> Result<(), ExitError> {
		stack.check(self.pop, self.push)
	}

	/// Whether two descriptors declare the same shape. Behaviours are not
	/// compared.
	#[must_use]
	pub fn same_shape(&self, other: &Self) -> bool {
		self.valid == other.valid
			&& self.pop == other.pop
			&& self.push == other.push
			&& self.memory_size.is_some() == other.memory_size.is_some()
			&& self.halts == other.halts
			&& self.jumps == other.jumps
			&& self.writes == other.writes
			&& self.reverts == other.reverts
	}
}

impl fmt::Debug for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Operation")
			.field("pop", &self.pop)
			.field("push", &self.push)
			.field("memory", &self.memory_size.is_some())
			.field("halts", &self.halts)
			.field("jumps", &self.jumps)
			.field("writes", &self.writes)
			.field("reverts", &self.reverts)
			.field("valid", &self.valid)
			.finish()
	}
}

/// Opcode to descriptor table.
#[derive(Clone, Copy, Debug)]
pub struct InstructionSet {
	operations: [Operation; 256],
}

/// Frontier instruction set.
pub static FRONTIER_INSTRUCTION_SET: InstructionSet = InstructionSet::frontier();
/// Homestead instruction set.
pub static HOMESTEAD_INSTRUCTION_SET: InstructionSet = InstructionSet::homestead();

macro_rules! table {
	( $table:ident; $( $opcode:ident => $operation:expr ),* $(,)? ) => {
		$( $table[Opcode::$opcode.as_usize()] = $operation; )*
	};
}

impl InstructionSet {
	/// An instruction set where every opcode is invalid.
	#[must_use]
	pub const fn empty() -> Self {
		Self {
			operations: [Operation::INVALID; 256],
		}
	}

	/// Return a copy of this set with `opcode` described by `operation`.
	#[must_use]
	pub const fn with(mut self, opcode: Opcode, operation: Operation) -> Self {
		self.operations[opcode.as_usize()] = operation;
		self
	}

	/// Copy `base` and replace the given descriptors.
	#[must_use]
	pub fn overlay(base: &Self, overrides: &[(Opcode, Operation)]) -> Self {
		let mut set = *base;
		for (opcode, operation) in overrides {
			set.operations[opcode.as_usize()] = *operation;
		}
		set
	}

	/// Descriptor of `opcode`.
	#[inline]
	#[must_use]
	pub const fn get(&self, opcode: Opcode) -> &Operation {
		&self.operations[opcode.as_usize()]
	}

	/// Opcodes that are part of this set.
	pub fn valid_opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
		(0..=255u8)
			.map(Opcode)
			.filter(move |opcode| self.get(*opcode).valid)
	}

	/// Whether every valid opcode of `other` is valid here with the same
	/// shape.
	#[must_use]
	pub fn is_superset_of(&self, other: &Self) -> bool {
		other
			.valid_opcodes()
			.all(|opcode| self.get(opcode).same_shape(other.get(opcode)))
	}

	/// The Frontier instruction set.
	#[must_use]
	#[allow(clippy::too_many_lines)]
	pub const fn frontier() -> Self {
		let mut t = [Operation::INVALID; 256];

		table!(t;
			STOP => Operation::new(eval::stop, 0, 0).halting(),
			ADD => Operation::new(eval::add, 2, 1),
			MUL => Operation::new(eval::mul, 2, 1),
			SUB => Operation::new(eval::sub, 2, 1),
			DIV => Operation::new(eval::div, 2, 1),
			SDIV => Operation::new(eval::sdiv, 2, 1),
			MOD => Operation::new(eval::rem, 2, 1),
			SMOD => Operation::new(eval::smod, 2, 1),
			ADDMOD => Operation::new(eval::addmod, 3, 1),
			MULMOD => Operation::new(eval::mulmod, 3, 1),
			EXP => Operation::new(eval::exp, 2, 1),
			SIGNEXTEND => Operation::new(eval::signextend, 2, 1),

			LT => Operation::new(eval::lt, 2, 1),
			GT => Operation::new(eval::gt, 2, 1),
			SLT => Operation::new(eval::slt, 2, 1),
			SGT => Operation::new(eval::sgt, 2, 1),
			EQ => Operation::new(eval::eq, 2, 1),
			ISZERO => Operation::new(eval::iszero, 1, 1),
			AND => Operation::new(eval::and, 2, 1),
			OR => Operation::new(eval::or, 2, 1),
			XOR => Operation::new(eval::xor, 2, 1),
			NOT => Operation::new(eval::not, 1, 1),
			BYTE => Operation::new(eval::byte, 2, 1),

			SHA3 => Operation::new(eval::sha3, 2, 1).with_memory(memory::sha3),

			ADDRESS => Operation::new(eval::address, 0, 1),
			BALANCE => Operation::new(eval::balance, 1, 1),
			ORIGIN => Operation::new(eval::origin, 0, 1),
			CALLER => Operation::new(eval::caller, 0, 1),
			CALLVALUE => Operation::new(eval::callvalue, 0, 1),
			CALLDATALOAD => Operation::new(eval::calldataload, 1, 1),
			CALLDATASIZE => Operation::new(eval::calldatasize, 0, 1),
			CALLDATACOPY => Operation::new(eval::calldatacopy, 3, 0).with_memory(memory::calldatacopy),
			CODESIZE => Operation::new(eval::codesize, 0, 1),
			CODECOPY => Operation::new(eval::codecopy, 3, 0).with_memory(memory::codecopy),
			GASPRICE => Operation::new(eval::gasprice, 0, 1),
			EXTCODESIZE => Operation::new(eval::extcodesize, 1, 1),
			EXTCODECOPY => Operation::new(eval::extcodecopy, 4, 0).with_memory(memory::extcodecopy),

			BLOCKHASH => Operation::new(eval::blockhash, 1, 1),
			COINBASE => Operation::new(eval::coinbase, 0, 1),
			TIMESTAMP => Operation::new(eval::timestamp, 0, 1),
			NUMBER => Operation::new(eval::number, 0, 1),
			DIFFICULTY => Operation::new(eval::difficulty, 0, 1),
			GASLIMIT => Operation::new(eval::gaslimit, 0, 1),

			POP => Operation::new(eval::pop, 1, 0),
			MLOAD => Operation::new(eval::mload, 1, 1).with_memory(memory::mload),
			MSTORE => Operation::new(eval::mstore, 2, 0).with_memory(memory::mstore),
			MSTORE8 => Operation::new(eval::mstore8, 2, 0).with_memory(memory::mstore8),
			SLOAD => Operation::new(eval::sload, 1, 1),
			SSTORE => Operation::new(eval::sstore, 2, 0).writing(),
			JUMP => Operation::new(eval::jump, 1, 0).jumping(),
			JUMPI => Operation::new(eval::jumpi, 2, 0).jumping(),
			PC => Operation::new(eval::pc, 0, 1),
			MSIZE => Operation::new(eval::msize, 0, 1),
			GAS => Operation::new(eval::gas, 0, 1),
			JUMPDEST => Operation::new(eval::jumpdest, 0, 0),

			PUSH1 => Operation::new(eval::push::<1>, 0, 1),
			PUSH2 => Operation::new(eval::push::<2>, 0, 1),
			PUSH3 => Operation::new(eval::push::<3>, 0, 1),
			PUSH4 => Operation::new(eval::push::<4>, 0, 1),
			PUSH5 => Operation::new(eval::push::<5>, 0, 1),
			PUSH6 => Operation::new(eval::push::<6>, 0, 1),
			PUSH7 => Operation::new(eval::push::<7>, 0, 1),
			PUSH8 => Operation::new(eval::push::<8>, 0, 1),
			PUSH9 => Operation::new(eval::push::<9>, 0, 1),
			PUSH10 => Operation::new(eval::push::<10>, 0, 1),
			PUSH11 => Operation::new(eval::push::<11>, 0, 1),
			PUSH12 => Operation::new(eval::push::<12>, 0, 1),
			PUSH13 => Operation::new(eval::push::<13>, 0, 1),
			PUSH14 => Operation::new(eval::push::<14>, 0, 1),
			PUSH15 => Operation::new(eval::push::<15>, 0, 1),
			PUSH16 => Operation::new(eval::push::<16>, 0, 1),
			PUSH17 => Operation::new(eval::push::<17>, 0, 1),
			PUSH18 => Operation::new(eval::push::<18>, 0, 1),
			PUSH19 => Operation::new(eval::push::<19>, 0, 1),
			PUSH20 => Operation::new(eval::push::<20>, 0, 1),
			PUSH21 => Operation::new(eval::push::<21>, 0, 1),
			PUSH22 => Operation::new(eval::push::<22>, 0, 1),
			PUSH23 => Operation::new(eval::push::<23>, 0, 1),
			PUSH24 => Operation::new(eval::push::<24>, 0, 1),
			PUSH25 => Operation::new(eval::push::<25>, 0, 1),
			PUSH26 => Operation::new(eval::push::<26>, 0, 1),
			PUSH27 => Operation::new(eval::push::<27>, 0, 1),
			PUSH28 => Operation::new(eval::push::<28>, 0, 1),
			PUSH29 => Operation::new(eval::push::<29>, 0, 1),
			PUSH30 => Operation::new(eval::push::<30>, 0, 1),
			PUSH31 => Operation::new(eval::push::<31>, 0, 1),
			PUSH32 => Operation::new(eval::push::<32>, 0, 1),

			DUP1 => Operation::new(eval::dup::<1>, 1, 2),
			DUP2 => Operation::new(eval::dup::<2>, 2, 3),
			DUP3 => Operation::new(eval::dup::<3>, 3, 4),
			DUP4 => Operation::new(eval::dup::<4>, 4, 5),
			DUP5 => Operation::new(eval::dup::<5>, 5, 6),
			DUP6 => Operation::new(eval::dup::<6>, 6, 7),
			DUP7 => Operation::new(eval::dup::<7>, 7, 8),
			DUP8 => Operation::new(eval::dup::<8>, 8, 9),
			DUP9 => Operation::new(eval::dup::<9>, 9, 10),
			DUP10 => Operation::new(eval::dup::<10>, 10, 11),
			DUP11 => Operation::new(eval::dup::<11>, 11, 12),
			DUP12 => Operation::new(eval::dup::<12>, 12, 13),
			DUP13 => Operation::new(eval::dup::<13>, 13, 14),
			DUP14 => Operation::new(eval::dup::<14>, 14, 15),
			DUP15 => Operation::new(eval::dup::<15>, 15, 16),
			DUP16 => Operation::new(eval::dup::<16>, 16, 17),

			SWAP1 => Operation::new(eval::swap::<1>, 2, 2),
			SWAP2 => Operation::new(eval::swap::<2>, 3, 3),
			SWAP3 => Operation::new(eval::swap::<3>, 4, 4),
			SWAP4 => Operation::new(eval::swap::<4>, 5, 5),
			SWAP5 => Operation::new(eval::swap::<5>, 6, 6),
			SWAP6 => Operation::new(eval::swap::<6>, 7, 7),
			SWAP7 => Operation::new(eval::swap::<7>, 8, 8),
			SWAP8 => Operation::new(eval::swap::<8>, 9, 9),
			SWAP9 => Operation::new(eval::swap::<9>, 10, 10),
			SWAP10 => Operation::new(eval::swap::<10>, 11, 11),
			SWAP11 => Operation::new(eval::swap::<11>, 12, 12),
			SWAP12 => Operation::new(eval::swap::<12>, 13, 13),
			SWAP13 => Operation::new(eval::swap::<13>, 14, 14),
			SWAP14 => Operation::new(eval::swap::<14>, 15, 15),
			SWAP15 => Operation::new(eval::swap::<15>, 16, 16),
			SWAP16 => Operation::new(eval::swap::<16>, 17, 17),

			LOG0 => Operation::new(eval::log::<0>, 2, 0).with_memory(memory::log).writing(),
			LOG1 => Operation::new(eval::log::<1>, 3, 0).with_memory(memory::log).writing(),
			LOG2 => Operation::new(eval::log::<2>, 4, 0).with_memory(memory::log).writing(),
			LOG3 => Operation::new(eval::log::<3>, 5, 0).with_memory(memory::log).writing(),
			LOG4 => Operation::new(eval::log::<4>, 6, 0).with_memory(memory::log).writing(),

			CREATE => Operation::new(eval::create, 3, 1).with_memory(memory::create).writing(),
			CALL => Operation::new(eval::call, 7, 1).with_memory(memory::call),
			CALLCODE => Operation::new(eval::call_code, 7, 1).with_memory(memory::call),
			RETURN => Operation::new(eval::ret, 2, 0).with_memory(memory::ret).halting(),
			SELFDESTRUCT => Operation::new(eval::suicide, 1, 0).halting().writing(),
		);

		Self { operations: t }
	}

	/// The Homestead instruction set: Frontier plus `DELEGATECALL`.
	#[must_use]
	pub const fn homestead() -> Self {
		Self::frontier().with(
			Opcode::DELEGATECALL,
			Operation::new(eval::delegate_call, 6, 1).with_memory(memory::delegate_call),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn homestead_extends_frontier_with_delegatecall_only() {
		assert!(HOMESTEAD_INSTRUCTION_SET.is_superset_of(&FRONTIER_INSTRUCTION_SET));
		assert!(!FRONTIER_INSTRUCTION_SET.is_superset_of(&HOMESTEAD_INSTRUCTION_SET));

		let added: Vec<Opcode> = HOMESTEAD_INSTRUCTION_SET
			.valid_opcodes()
			.filter(|opcode| !FRONTIER_INSTRUCTION_SET.get(*opcode).valid)
			.collect();
		assert_eq!(added, vec![Opcode::DELEGATECALL]);
	}

	#[test]
	fn frontier_contents() {
		let set = &FRONTIER_INSTRUCTION_SET;
		assert_eq!(set.valid_opcodes().count(), 129);
		assert!(!set.get(Opcode::INVALID).valid);
		assert!(!set.get(Opcode::DELEGATECALL).valid);
		assert!(!set.get(Opcode(0xfd)).valid);
		assert!(!set.get(Opcode(0x0c)).valid);
		assert!(set.get(Opcode::GAS).valid);
		assert!(set.get(Opcode::GASPRICE).valid);
		assert!(set.get(Opcode::GASLIMIT).valid);
	}

	#[test]
	fn write_flags() {
		let set = &HOMESTEAD_INSTRUCTION_SET;
		let writers: Vec<Opcode> = set
			.valid_opcodes()
			.filter(|opcode| set.get(*opcode).writes)
			.collect();
		assert_eq!(
			writers,
			vec![
				Opcode::SSTORE,
				Opcode::LOG0,
				Opcode::LOG1,
				Opcode::LOG2,
				Opcode::LOG3,
				Opcode::LOG4,
				Opcode::CREATE,
				Opcode::SELFDESTRUCT,
			]
		);
	}

	#[test]
	fn stack_requirements() {
		let set = &HOMESTEAD_INSTRUCTION_SET;
		assert_eq!((set.get(Opcode::DUP16).pop, set.get(Opcode::DUP16).push), (16, 17));
		assert_eq!((set.get(Opcode::SWAP1).pop, set.get(Opcode::SWAP1).push), (2, 2));
		assert_eq!((set.get(Opcode::CALL).pop, set.get(Opcode::CALL).push), (7, 1));
		assert_eq!(
			(set.get(Opcode::DELEGATECALL).pop, set.get(Opcode::DELEGATECALL).push),
			(6, 1)
		);
	}

	#[test]
	fn overlay_leaves_base_untouched() {
		let set = InstructionSet::overlay(
			&HOMESTEAD_INSTRUCTION_SET,
			&[(Opcode(0xfd), Operation::new(eval::ret, 2, 0).reverting())],
		);
		assert!(set.get(Opcode(0xfd)).reverts);
		assert!(set.get(Opcode(0xfd)).halts);
		assert!(!HOMESTEAD_INSTRUCTION_SET.get(Opcode(0xfd)).valid);
		assert!(set.is_superset_of(&HOMESTEAD_INSTRUCTION_SET));
	}

	#[test]
	fn empty_set_has_no_valid_opcode() {
		assert_eq!(InstructionSet::empty().valid_opcodes().count(), 0);
		assert!(InstructionSet::empty().get(Opcode::STOP).same_shape(&Operation::INVALID));
	}
}
