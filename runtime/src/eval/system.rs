use super::Control;
use crate::prelude::*;
use crate::{
	CallScheme, CreateScheme, ExitError, ExitReason, ExitSucceed, Handler, Runtime, Transfer,
};
use core::cmp::min;
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

pub fn sha3(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, from, len);

	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let from = as_usize_or_fail!(from);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(from, len)
	};

	let ret = Keccak256::digest(data.as_slice());
	push_h256!(runtime, H256::from_slice(ret.as_slice()));

	Control::Continue
}

pub fn address(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let ret = H256::from(runtime.context.address);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn balance(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.balance(address.into()));

	Control::Continue
}

pub fn origin(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	let ret = H256::from(handler.origin());
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn caller(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let ret = H256::from(runtime.context.caller);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn callvalue(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let value = runtime.context.apparent_value;
	push_u256!(runtime, value);

	Control::Continue
}

pub fn gasprice(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.gas_price());

	Control::Continue
}

pub fn extcodesize(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.code_size(address.into()));

	Control::Continue
}

pub fn extcodecopy(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, address);
	pop_u256!(runtime, memory_offset, code_offset, len);

	if len == U256::zero() {
		return Control::Continue;
	}

	let code = handler.code(address.into());
	try_or_fail!(runtime
		.machine
		.memory_mut()
		.copy_large(memory_offset, code_offset, len, &code));

	Control::Continue
}

pub fn blockhash(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, number);
	push_h256!(runtime, handler.block_hash(number));

	Control::Continue
}

pub fn coinbase(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_h256!(runtime, H256::from(handler.block_coinbase()));

	Control::Continue
}

pub fn timestamp(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.block_timestamp());

	Control::Continue
}

pub fn number(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.block_number());

	Control::Continue
}

pub fn difficulty(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.block_difficulty());

	Control::Continue
}

pub fn gaslimit(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.block_gas_limit());

	Control::Continue
}

pub fn sload(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, index);
	let value = handler.storage(runtime.context.address, index);
	push_h256!(runtime, value);

	event!(SLoad {
		address: runtime.context.address,
		index,
		value
	});

	Control::Continue
}

pub fn sstore(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, index, value);

	event!(SStore {
		address: runtime.context.address,
		index,
		value
	});

	match handler.set_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

/// Gas left in the current frame, after the cost of `GAS` itself.
pub fn gas(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	push_u256!(runtime, handler.gas_left());

	Control::Continue
}

/// `LOG0`..`LOG4`.
pub fn log<const N: usize>(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, offset, len);

	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let offset = as_usize_or_fail!(offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(offset, len)
	};

	let mut topics = Vec::with_capacity(N);
	for _ in 0..N {
		pop_h256!(runtime, topic);
		topics.push(topic);
	}

	match handler.log(runtime.context.address, topics, data) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

/// `SELFDESTRUCT`: moves the whole balance to the beneficiary and halts.
pub fn suicide(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_h256!(runtime, target);

	match handler.mark_delete(runtime.context.address, target.into()) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Halt(ExitSucceed::Suicided)
}

/// `CREATE`: runs the init code taken from memory in a nested frame with all
/// remaining gas, then pushes the new address, or zero on failure.
pub fn create(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, value, code_offset, len);

	let code = if len == U256::zero() {
		Vec::new()
	} else {
		let code_offset = as_usize_or_fail!(code_offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(code_offset, len)
	};

	let caller = runtime.context.address;
	let scheme = CreateScheme::Legacy { caller };

	let (reason, address, _) = handler.create(caller, scheme, value, code, None);
	match reason {
		ExitReason::Succeed(_) | ExitReason::Error(ExitError::CodeStoreOutOfGas) => {
			let create_address: H256 = address.map(Into::into).unwrap_or_default();
			push_h256!(runtime, create_address);
			Control::Continue
		}
		ExitReason::Revert(_) | ExitReason::Error(_) => {
			push_u256!(runtime, U256::zero());
			Control::Continue
		}
	}
}

pub fn call(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	call_inner(runtime, CallScheme::Call, handler)
}

pub fn call_code(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	call_inner(runtime, CallScheme::CallCode, handler)
}

pub fn delegate_call(runtime: &mut Runtime, handler: &mut dyn Handler) -> Control {
	call_inner(runtime, CallScheme::DelegateCall, handler)
}

/// Shared body of the call family.
///
/// 1. Pops `gas, to, [value,] in_offset, in_len, out_offset, out_len`.
/// 2. Runs the target's code in a nested frame through the handler. The
///    gas argument has already been checked against the remaining gas.
/// 3. Copies at most `out_len` bytes of the return data to `out_offset`
///    and pushes 1 on success, 0 otherwise. The caller keeps running in
///    every case.
fn call_inner(runtime: &mut Runtime, scheme: CallScheme, handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, gas);
	pop_h256!(runtime, to);
	let gas = if gas > crate::utils::U64_MAX {
		None
	} else {
		Some(gas.as_u64())
	};

	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => {
			pop_u256!(runtime, value);
			value
		}
		CallScheme::DelegateCall => U256::zero(),
	};

	pop_u256!(runtime, in_offset, in_len, out_offset, out_len);

	let input = if in_len == U256::zero() {
		Vec::new()
	} else {
		let in_offset = as_usize_or_fail!(in_offset);
		let in_len = as_usize_or_fail!(in_len);

		runtime.machine.memory().get(in_offset, in_len)
	};

	let context = runtime.context.for_call(scheme, to.into(), value);

	let transfer = match scheme {
		CallScheme::Call => Some(Transfer {
			source: runtime.context.address,
			target: to.into(),
			value,
		}),
		CallScheme::CallCode => Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		}),
		CallScheme::DelegateCall => None,
	};

	let (reason, return_data) = handler.call(to.into(), transfer, input, gas, context);

	match reason {
		ExitReason::Succeed(_) => {
			if out_len != U256::zero() {
				let out_offset = as_usize_or_fail!(out_offset);
				let out_len = as_usize_or_fail!(out_len);
				let copied = min(out_len, return_data.len());
				try_or_fail!(runtime
					.machine
					.memory_mut()
					.set(out_offset, &return_data[..copied], None));
			}

			push_u256!(runtime, U256::one());
			Control::Continue
		}
		ExitReason::Revert(_) | ExitReason::Error(_) => {
			push_u256!(runtime, U256::zero());
			Control::Continue
		}
	}
}
