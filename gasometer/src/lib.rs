//! EVM gasometer: Frontier and Homestead gas accounting of a single frame.

#![cfg_attr(not(feature = "std"), no_std)]

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

#[cfg(feature = "force-debug")]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => (
		log::trace!(target: "evm", "Gasometer {} [Gas used: {}, Gas left: {}]", format_args!($($arg)*),
		$self.total_used_gas(), $self.gas());
	);
}

#[cfg(not(feature = "force-debug"))]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => {};
}

mod consts;
mod costs;

use core::cmp::max;
use evm_core::{ExitError, Opcode, Stack};
use evm_runtime::{Config, Fork, Handler};
use primitive_types::{H160, H256, U256};

pub use crate::consts::G_CODEDEPOSIT;

/// Gas accounting state at a point in time.
#[derive(Debug, Copy, Clone)]
pub struct Snapshot {
	pub gas_limit: u64,
	pub memory_gas: u64,
	pub used_gas: u64,
	pub refunded_gas: i64,
}

/// EVM gasometer.
///
/// Every charge is atomic: a charge that cannot be paid returns `OutOfGas`
/// and leaves the meter as it was. A frame that faults calls
/// [`Gasometer::fail`], which consumes everything that is left.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	config: &'config Config,
	inner: Result<Inner, ExitError>,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	#[must_use]
	pub const fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			config,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
				refunded_gas: 0,
			}),
		}
	}

	#[inline]
	fn inner(&self) -> Result<&Inner, ExitError> {
		self.inner.as_ref().map_err(Clone::clone)
	}

	#[inline]
	fn inner_mut(&mut self) -> Result<&mut Inner, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	/// Reference of the config.
	#[inline]
	#[must_use]
	pub const fn config(&self) -> &'config Config {
		self.config
	}

	/// Gas limit of this gasometer.
	#[inline]
	#[must_use]
	pub const fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	/// Remaining gas.
	#[inline]
	#[must_use]
	pub fn gas(&self) -> u64 {
		self.inner.as_ref().map_or(0, |inner| {
			self.gas_limit - inner.used_gas - inner.memory_gas
		})
	}

	/// Total used gas, memory included.
	#[inline]
	#[must_use]
	pub fn total_used_gas(&self) -> u64 {
		self.inner
			.as_ref()
			.map_or(self.gas_limit, |inner| inner.used_gas + inner.memory_gas)
	}

	/// Refunded gas.
	#[inline]
	#[must_use]
	pub fn refunded_gas(&self) -> i64 {
		self.inner.as_ref().map_or(0, |inner| inner.refunded_gas)
	}

	/// Whether the gasometer has been consumed by a fault.
	#[must_use]
	pub const fn is_failed(&self) -> bool {
		self.inner.is_err()
	}

	/// Consume all remaining gas. Any later charge fails.
	pub fn fail(&mut self) -> ExitError {
		self.inner = Err(ExitError::OutOfGas);
		ExitError::OutOfGas
	}

	/// Record an explicit cost.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` if the cost exceeds the remaining gas
	#[inline]
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		event!(RecordCost {
			cost,
			snapshot: self.snapshot(),
		});

		let gas = self.gas();
		let inner = self.inner_mut()?;
		if cost > gas {
			return Err(ExitError::OutOfGas);
		}
		inner.used_gas += cost;

		log_gas!(self, "record_cost: {}", cost);
		Ok(())
	}

	/// Record an explicit refund.
	///
	/// # Errors
	/// Return `ExitError` if the gasometer has failed
	#[inline]
	pub fn record_refund(&mut self, refund: i64) -> Result<(), ExitError> {
		event!(RecordRefund {
			refund,
			snapshot: self.snapshot(),
		});

		let inner = self.inner_mut()?;
		inner.refunded_gas = inner.refunded_gas.saturating_add(refund);

		log_gas!(self, "record_refund: {}", refund);
		Ok(())
	}

	/// Return gas left unused by a child frame.
	///
	/// # Errors
	/// Return `ExitError` if the gasometer has failed
	#[inline]
	pub fn record_stipend(&mut self, stipend: u64) -> Result<(), ExitError> {
		event!(RecordStipend {
			stipend,
			snapshot: self.snapshot(),
		});

		let inner = self.inner_mut()?;
		inner.used_gas = inner.used_gas.saturating_sub(stipend);

		log_gas!(self, "record_stipend: {}", stipend);
		Ok(())
	}

	/// Record the code deposit of a creation returning `len` bytes.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` if the deposit cannot be paid
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = u64::try_from(len)
			.ok()
			.and_then(|len| len.checked_mul(G_CODEDEPOSIT))
			.ok_or(ExitError::OutOfGas)?;
		self.record_cost(cost)
	}

	/// Record the dynamic cost of an opcode, together with the growth of
	/// memory to `memory_end` bytes.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` or `ExitError::GasUintOverflow`
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory_end: Option<usize>,
	) -> Result<(), ExitError> {
		let gas = self.gas();
		let paid_memory_gas = self.inner()?.memory_gas;

		let memory_gas = match memory_end {
			Some(end) => {
				let words = u64::try_from(end)
					.map_err(|_| ExitError::GasUintOverflow)?
					.div_ceil(32);
				max(paid_memory_gas, costs::memory_gas(words)?)
			}
			None => paid_memory_gas,
		};
		let gas_cost = cost.cost(self.config)?;
		let gas_refund = cost.refund(self.config);

		event!(RecordDynamicCost {
			gas_cost,
			memory_gas,
			gas_refund,
			snapshot: self.snapshot(),
		});

		let total = gas_cost
			.checked_add(memory_gas - paid_memory_gas)
			.ok_or(ExitError::GasUintOverflow)?;
		if total > gas {
			return Err(ExitError::OutOfGas);
		}

		// The forwarded gas of the call family must be fully available
		// once the call itself is paid for.
		if let GasCost::Call { gas: forwarded, .. }
		| GasCost::CallCode { gas: forwarded, .. }
		| GasCost::DelegateCall { gas: forwarded } = cost
		{
			if forwarded > U256::from(gas - total) {
				return Err(ExitError::OutOfGas);
			}
		}

		let inner = self.inner_mut()?;
		inner.used_gas += gas_cost;
		inner.memory_gas = memory_gas;
		inner.refunded_gas = inner.refunded_gas.saturating_add(gas_refund);

		log_gas!(
			self,
			"record_dynamic_cost: {} - {} - {}",
			gas_cost,
			memory_gas,
			gas_refund
		);
		Ok(())
	}

	/// Current accounting state, `None` once failed.
	#[must_use]
	pub fn snapshot(&self) -> Option<Snapshot> {
		self.inner.as_ref().ok().map(|inner| Snapshot {
			gas_limit: self.gas_limit,
			memory_gas: inner.memory_gas,
			used_gas: inner.used_gas,
			refunded_gas: inner.refunded_gas,
		})
	}
}

/// Cost of opcodes whose price never depends on their operands.
#[inline]
#[must_use]
pub const fn static_opcode_cost(opcode: Opcode) -> Option<u64> {
	const TABLE: [Option<u64>; 256] = {
		let mut table = [None; 256];

		table[Opcode::STOP.as_usize()] = Some(consts::G_ZERO);

		table[Opcode::ADD.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::SUB.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::NOT.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::LT.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::GT.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::SLT.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::SGT.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::EQ.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::ISZERO.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::AND.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::OR.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::XOR.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::BYTE.as_usize()] = Some(consts::G_VERYLOW);
		table[Opcode::CALLDATALOAD.as_usize()] = Some(consts::G_VERYLOW);

		table[Opcode::MUL.as_usize()] = Some(consts::G_LOW);
		table[Opcode::DIV.as_usize()] = Some(consts::G_LOW);
		table[Opcode::SDIV.as_usize()] = Some(consts::G_LOW);
		table[Opcode::MOD.as_usize()] = Some(consts::G_LOW);
		table[Opcode::SMOD.as_usize()] = Some(consts::G_LOW);
		table[Opcode::SIGNEXTEND.as_usize()] = Some(consts::G_LOW);

		table[Opcode::ADDMOD.as_usize()] = Some(consts::G_MID);
		table[Opcode::MULMOD.as_usize()] = Some(consts::G_MID);
		table[Opcode::JUMP.as_usize()] = Some(consts::G_MID);

		table[Opcode::JUMPI.as_usize()] = Some(consts::G_HIGH);

		table[Opcode::ADDRESS.as_usize()] = Some(consts::G_BASE);
		table[Opcode::ORIGIN.as_usize()] = Some(consts::G_BASE);
		table[Opcode::CALLER.as_usize()] = Some(consts::G_BASE);
		table[Opcode::CALLVALUE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::CALLDATASIZE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::CODESIZE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::GASPRICE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::COINBASE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::TIMESTAMP.as_usize()] = Some(consts::G_BASE);
		table[Opcode::NUMBER.as_usize()] = Some(consts::G_BASE);
		table[Opcode::DIFFICULTY.as_usize()] = Some(consts::G_BASE);
		table[Opcode::GASLIMIT.as_usize()] = Some(consts::G_BASE);
		table[Opcode::POP.as_usize()] = Some(consts::G_BASE);
		table[Opcode::PC.as_usize()] = Some(consts::G_BASE);
		table[Opcode::MSIZE.as_usize()] = Some(consts::G_BASE);
		table[Opcode::GAS.as_usize()] = Some(consts::G_BASE);

		table[Opcode::JUMPDEST.as_usize()] = Some(consts::G_JUMPDEST);
		table[Opcode::BLOCKHASH.as_usize()] = Some(consts::G_BLOCKHASH);

		let mut opcode = Opcode::PUSH1.as_usize();
		while opcode <= Opcode::SWAP16.as_usize() {
			table[opcode] = Some(consts::G_VERYLOW);
			opcode += 1;
		}

		table
	};

	TABLE[opcode.as_usize()]
}

/// Dynamic cost of `opcode`, read from the operands on the stack.
///
/// # Errors
/// Return `ExitError` if an operand is missing
pub fn dynamic_opcode_cost<H: Handler + ?Sized>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	config: &Config,
	handler: &H,
) -> Result<GasCost, ExitError> {
	let gas_cost = match opcode {
		Opcode::RETURN => GasCost::Zero,
		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::BALANCE => GasCost::Balance,
		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::SLOAD => GasCost::SLoad,

		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},
		Opcode::SHA3 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: stack.peek(3)?,
		},
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => GasCost::Log {
			n: opcode.as_u8() - Opcode::LOG0.as_u8(),
			len: stack.peek(1)?,
		},

		Opcode::SSTORE => {
			let index = stack.peek_h256(0)?;
			let value = stack.peek_h256(1)?;

			GasCost::SStore {
				current: handler.storage(address, index),
				new: value,
			}
		}

		Opcode::CREATE => GasCost::Create,
		Opcode::CALL => GasCost::Call {
			value: stack.peek(2)?,
			gas: stack.peek(0)?,
			target_exists: handler.exists(stack.peek_h256(1)?.into()),
		},
		Opcode::CALLCODE => GasCost::CallCode {
			value: stack.peek(2)?,
			gas: stack.peek(0)?,
		},
		Opcode::DELEGATECALL if config.fork >= Fork::Homestead => GasCost::DelegateCall {
			gas: stack.peek(0)?,
		},
		Opcode::SELFDESTRUCT => GasCost::Suicide {
			already_removed: handler.deleted(address),
		},

		_ => GasCost::Invalid(opcode),
	};

	Ok(gas_cost)
}

#[derive(Clone, Debug)]
struct Inner {
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
}

/// Gas cost.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,
	/// Balance gas cost.
	Balance,
	/// `EXTCODESIZE` gas cost.
	ExtCodeSize,
	/// `SLOAD` gas cost.
	SLoad,

	/// Exponential gas cost.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// `SHA3` gas cost.
	Sha3 {
		/// Length of the data.
		len: U256,
	},
	/// Very low copy gas cost.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// `EXTCODECOPY` gas cost.
	ExtCodeCopy {
		/// Length.
		len: U256,
	},
	/// Log gas cost.
	Log {
		/// Topic length.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// `SSTORE` gas cost.
	SStore {
		/// Current value.
		current: H256,
		/// New value.
		new: H256,
	},
	/// `CREATE` gas cost.
	Create,
	/// Call gas cost.
	Call {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Callcode gas cost.
	CallCode {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
	},
	/// Delegate call gas cost.
	DelegateCall {
		/// Call gas.
		gas: U256,
	},
	/// Suicide gas cost.
	Suicide {
		/// Whether the account has already been marked for deletion.
		already_removed: bool,
	},
	/// Opcode without a price under this fork.
	Invalid(Opcode),
}

impl GasCost {
	fn cost(self, config: &Config) -> Result<u64, ExitError> {
		Ok(match self {
			Self::Zero => consts::G_ZERO,
			Self::VeryLow => consts::G_VERYLOW,
			Self::Balance => config.gas_balance,
			Self::ExtCodeSize => config.gas_ext_code,
			Self::SLoad => config.gas_sload,

			Self::Exp { power } => costs::exp_cost(power, config)?,
			Self::Sha3 { len } => costs::sha3_cost(len)?,
			Self::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			Self::ExtCodeCopy { len } => costs::extcodecopy_cost(len, config)?,
			Self::Log { n, len } => costs::log_cost(n, len)?,
			Self::SStore { current, new } => costs::sstore_cost(current, new, config),

			Self::Create => costs::create_cost(),
			Self::Call {
				value,
				target_exists,
				..
			} => costs::call_cost(value, true, !target_exists, config),
			Self::CallCode { value, .. } => costs::call_cost(value, true, false, config),
			Self::DelegateCall { .. } => costs::call_cost(U256::zero(), false, false, config),
			Self::Suicide { .. } => costs::suicide_cost(config),

			Self::Invalid(opcode) => return Err(ExitError::InvalidCode(opcode)),
		})
	}

	fn refund(self, config: &Config) -> i64 {
		match self {
			Self::SStore { current, new } => costs::sstore_refund(current, new, config),
			Self::Suicide { already_removed } => costs::suicide_refund(already_removed),
			_ => 0,
		}
	}
}
