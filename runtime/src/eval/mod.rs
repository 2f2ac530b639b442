//! Opcode behaviours. Every behaviour has the shape
//! `fn(&mut Runtime, &mut dyn Handler) -> Control` so that instruction sets
//! can store them as plain function pointers.

#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;
mod system;

use crate::{ExitReason, ExitSucceed, Handler, Runtime};
use core::ops::{BitAnd, BitOr, BitXor};
use primitive_types::U256;

pub use self::misc::{
	calldatacopy, calldataload, calldatasize, codecopy, codesize, dup, invalid, jump, jumpdest,
	jumpi, mload, msize, mstore, mstore8, pc, pop, push, ret, stop, swap,
};
pub use self::system::{
	address, balance, blockhash, call, call_code, caller, callvalue, coinbase, create,
	delegate_call, difficulty, extcodecopy, extcodesize, gas, gaslimit, gasprice, log, number,
	origin, sha3, sload, sstore, suicide, timestamp,
};

/// Control state returned by an opcode behaviour.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control {
	/// Proceed with the next instruction.
	Continue,
	/// Stop the frame normally. The execution loop turns this into a revert
	/// when the operation is flagged as reverting.
	Halt(ExitSucceed),
	/// Stop the frame with the given reason.
	Exit(ExitReason),
}

pub fn add(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_tuple!(runtime, overflowing_add)
}

pub fn mul(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_tuple!(runtime, overflowing_mul)
}

pub fn sub(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_tuple!(runtime, overflowing_sub)
}

pub fn div(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::div)
}

pub fn sdiv(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::sdiv)
}

pub fn rem(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::rem)
}

pub fn smod(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::srem)
}

pub fn addmod(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op3_u256_fn!(runtime, self::arithmetic::addmod)
}

pub fn mulmod(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op3_u256_fn!(runtime, self::arithmetic::mulmod)
}

pub fn exp(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::exp)
}

pub fn signextend(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::signextend)
}

pub fn lt(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_bool_ref!(runtime, lt)
}

pub fn gt(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_bool_ref!(runtime, gt)
}

pub fn slt(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::bitwise::slt)
}

pub fn sgt(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::bitwise::sgt)
}

pub fn eq(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_bool_ref!(runtime, eq)
}

pub fn iszero(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op1_u256_fn!(runtime, self::bitwise::iszero)
}

pub fn and(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256!(runtime, bitand)
}

pub fn or(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256!(runtime, bitor)
}

pub fn xor(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256!(runtime, bitxor)
}

pub fn not(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op1_u256_fn!(runtime, self::bitwise::not)
}

pub fn byte(runtime: &mut Runtime, _handler: &mut dyn Handler) -> Control {
	op2_u256_fn!(runtime, self::bitwise::byte)
}
