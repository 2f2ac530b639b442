use crate::instructions::{InstructionSet, FRONTIER_INSTRUCTION_SET, HOMESTEAD_INSTRUCTION_SET};

/// Protocol rule set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Fork {
	/// Initial release of the protocol.
	Frontier,
	/// Frontier plus `DELEGATECALL`, and failing creations that cannot pay
	/// for their code deposit.
	Homestead,
}

impl Fork {
	/// Instruction set active under this fork.
	#[must_use]
	pub fn instruction_set(self) -> &'static InstructionSet {
		match self {
			Self::Frontier => &FRONTIER_INSTRUCTION_SET,
			Self::Homestead => &HOMESTEAD_INSTRUCTION_SET,
		}
	}
}

/// Runtime configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
	/// Rule set.
	pub fork: Fork,
	/// Gas paid for extcodesize.
	pub gas_ext_code: u64,
	/// Gas paid for BALANCE opcode.
	pub gas_balance: u64,
	/// Gas paid for SLOAD opcode.
	pub gas_sload: u64,
	/// Gas paid for SSTORE opcode when a zero slot is set to non-zero.
	pub gas_sstore_set: u64,
	/// Gas paid for every other SSTORE.
	pub gas_sstore_reset: u64,
	/// Gas refunded when a non-zero slot is cleared.
	pub refund_sstore_clears: i64,
	/// Gas paid for SUICIDE opcode.
	pub gas_suicide: u64,
	/// Gas paid for CALL opcode.
	pub gas_call: u64,
	/// Gas paid for EXP opcode for every byte.
	pub gas_expbyte: u64,
	/// Stack limit.
	pub stack_limit: usize,
	/// Memory limit.
	pub memory_limit: usize,
	/// Call limit.
	pub call_stack_limit: usize,
	/// Call stipend.
	pub call_stipend: u64,
	/// Maximum refund is `used_gas / max_refund_quotient`.
	pub max_refund_quotient: u64,
	/// Whether a creation that cannot pay for its code deposit fails. When
	/// `false` the account is kept with empty code.
	pub fail_on_code_deposit_oog: bool,
}

impl Config {
	/// Frontier hard fork configuration.
	#[must_use]
	pub const fn frontier() -> Self {
		Self {
			fork: Fork::Frontier,
			gas_ext_code: 20,
			gas_balance: 20,
			gas_sload: 50,
			gas_sstore_set: 20000,
			gas_sstore_reset: 5000,
			refund_sstore_clears: 15000,
			gas_suicide: 0,
			gas_call: 40,
			gas_expbyte: 10,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			call_stipend: 2300,
			max_refund_quotient: 2,
			fail_on_code_deposit_oog: false,
		}
	}

	/// Homestead hard fork configuration.
	#[must_use]
	pub const fn homestead() -> Self {
		Self {
			fork: Fork::Homestead,
			fail_on_code_deposit_oog: true,
			..Self::frontier()
		}
	}

	/// Instruction set active under this configuration.
	#[must_use]
	pub fn instruction_set(&self) -> &'static InstructionSet {
		self.fork.instruction_set()
	}
}
