use super::Control;
use crate::{ExitError, ExitSucceed, Handler, Runtime};
use core::cmp::min;
use primitive_types::{H256, U256};

#[inline]
pub fn stop(_runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	Control::Halt(ExitSucceed::Stopped)
}

/// Behaviour slot of every opcode outside the active instruction set. The
/// execution loop rejects such opcodes before dispatch, so reaching this
/// function means a descriptor was marked valid with no behaviour.
#[inline]
pub fn invalid(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	match runtime.machine.opcode() {
		Some(opcode) => Control::Exit(ExitError::InvalidCode(opcode).into()),
		None => Control::Halt(ExitSucceed::Stopped),
	}
}

#[inline]
pub fn codesize(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let size = U256::from(runtime.machine.code().len());
	push_u256!(runtime, size);
	Control::Continue
}

#[inline]
pub fn codecopy(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, memory_offset, code_offset, len);

	let code = runtime.machine.code().to_vec();
	try_or_fail!(runtime
		.machine
		.memory_mut()
		.copy_large(memory_offset, code_offset, len, &code));
	Control::Continue
}

#[inline]
pub fn calldataload(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, index);

	let mut load = [0u8; 32];
	if index <= crate::utils::USIZE_MAX {
		let index = index.as_usize();
		let data = runtime.machine.data();
		if index < data.len() {
			let end = min(index.saturating_add(32), data.len());
			load[..end - index].copy_from_slice(&data[index..end]);
		}
	}

	push_h256!(runtime, H256::from(load));
	Control::Continue
}

#[inline]
pub fn calldatasize(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let len = U256::from(runtime.machine.data().len());
	push_u256!(runtime, len);
	Control::Continue
}

#[inline]
pub fn calldatacopy(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	if len == U256::zero() {
		return Control::Continue;
	}

	let data = runtime.machine.data().to_vec();
	try_or_fail!(runtime
		.machine
		.memory_mut()
		.copy_large(memory_offset, data_offset, len, &data));
	Control::Continue
}

#[inline]
pub fn pop(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, _val);
	Control::Continue
}

#[inline]
pub fn mload(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, index);
	let index = as_usize_or_fail!(index);
	let value = H256::from_slice(&runtime.machine.memory().get(index, 32)[..]);
	push_h256!(runtime, value);
	Control::Continue
}

#[inline]
pub fn mstore(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, index);
	pop_h256!(runtime, value);
	let index = as_usize_or_fail!(index);
	try_or_fail!(runtime
		.machine
		.memory_mut()
		.set(index, &value[..], Some(32)));
	Control::Continue
}

#[inline]
pub fn mstore8(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, index, value);
	let index = as_usize_or_fail!(index);
	let value = value.byte(0);
	try_or_fail!(runtime.machine.memory_mut().set(index, &[value], Some(1)));
	Control::Continue
}

/// `JUMP`: the destination must be a `JUMPDEST` outside of push data.
#[inline]
pub fn jump(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, dest);
	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);

	if runtime.machine.is_valid_jump(dest) {
		runtime.machine.set_position(dest);
		Control::Continue
	} else {
		Control::Exit(ExitError::InvalidJump.into())
	}
}

/// `JUMPI`: jumps when the condition is non-zero, otherwise steps to the
/// next instruction.
#[inline]
pub fn jumpi(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, dest);
	pop_u256!(runtime, value);

	if value == U256::zero() {
		runtime.machine.advance(1);
		return Control::Continue;
	}

	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);
	if runtime.machine.is_valid_jump(dest) {
		runtime.machine.set_position(dest);
		Control::Continue
	} else {
		Control::Exit(ExitError::InvalidJump.into())
	}
}

#[inline]
pub fn pc(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let position = U256::from(runtime.machine.position());
	push_u256!(runtime, position);
	Control::Continue
}

#[inline]
pub fn msize(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let size = U256::from(runtime.machine.memory().effective_len());
	push_u256!(runtime, size);
	Control::Continue
}

#[inline]
pub fn jumpdest(_runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	Control::Continue
}

/// `PUSH1`..`PUSH32`. Immediate bytes missing at the end of the code read
/// as zero.
#[inline]
pub fn push<const N: usize>(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let value = {
		let code = runtime.machine.code();
		let start = min(runtime.machine.position() + 1, code.len());
		let end = min(start + N, code.len());

		let mut value = [0u8; 32];
		value[32 - N..32 - N + (end - start)].copy_from_slice(&code[start..end]);
		value
	};

	push_u256!(runtime, U256::from_big_endian(&value));
	Control::Continue
}

#[inline]
pub fn dup<const N: usize>(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let value = try_or_fail!(runtime.machine.stack().peek(N - 1));
	push_u256!(runtime, value);
	Control::Continue
}

#[inline]
pub fn swap<const N: usize>(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	let val1 = try_or_fail!(runtime.machine.stack().peek(0));
	let val2 = try_or_fail!(runtime.machine.stack().peek(N));
	try_or_fail!(runtime.machine.stack_mut().set(0, val2));
	try_or_fail!(runtime.machine.stack_mut().set(N, val1));
	Control::Continue
}

/// `RETURN`: halts and exposes `memory[offset..offset + len]` as the
/// frame's return data.
#[inline]
pub fn ret(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	pop_u256!(runtime, start, len);
	if len == U256::zero() {
		runtime.machine.set_return_range(0..0);
	} else {
		let start = as_usize_or_fail!(start);
		let len = as_usize_or_fail!(len);
		runtime.machine.set_return_range(start..start + len);
	}
	Control::Halt(ExitSucceed::Returned)
}
