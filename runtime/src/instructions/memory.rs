//! Memory requirement of the operations that touch memory. Each function
//! reads its operands from the (already validated) stack and returns the end
//! offset of the accessed region, `None` for a zero-length access.

use crate::{ExitError, Stack};
use core::cmp::max;
use primitive_types::U256;

#[inline]
fn region(offset: U256, len: U256) -> Result<Option<U256>, ExitError> {
	if len.is_zero() {
		return Ok(None);
	}

	offset
		.checked_add(len)
		.map(Some)
		.ok_or(ExitError::GasUintOverflow)
}

#[inline]
fn stack_region(stack: &Stack, offset: usize, len: usize) -> Result<Option<U256>, ExitError> {
	region(stack.peek(offset)?, stack.peek(len)?)
}

pub fn sha3(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 0, 1)
}

pub fn calldatacopy(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 0, 2)
}

pub fn codecopy(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 0, 2)
}

pub fn extcodecopy(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 1, 3)
}

pub fn mload(stack: &Stack) -> Result<Option<U256>, ExitError> {
	region(stack.peek(0)?, U256::from(32))
}

pub fn mstore(stack: &Stack) -> Result<Option<U256>, ExitError> {
	region(stack.peek(0)?, U256::from(32))
}

pub fn mstore8(stack: &Stack) -> Result<Option<U256>, ExitError> {
	region(stack.peek(0)?, U256::one())
}

pub fn log(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 0, 1)
}

pub fn create(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 1, 2)
}

pub fn ret(stack: &Stack) -> Result<Option<U256>, ExitError> {
	stack_region(stack, 0, 1)
}

/// `CALL` and `CALLCODE` need both the input and the output window.
pub fn call(stack: &Stack) -> Result<Option<U256>, ExitError> {
	let input = stack_region(stack, 3, 4)?;
	let output = stack_region(stack, 5, 6)?;
	Ok(max(input, output))
}

pub fn delegate_call(stack: &Stack) -> Result<Option<U256>, ExitError> {
	let input = stack_region(stack, 2, 3)?;
	let output = stack_region(stack, 4, 5)?;
	Ok(max(input, output))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stack_of(values: &[u64]) -> Stack {
		let mut stack = Stack::new(1024);
		for value in values.iter().rev() {
			stack.push(U256::from(*value)).unwrap();
		}
		stack
	}

	#[test]
	fn zero_length_needs_no_memory() {
		let mut stack = Stack::new(1024);
		stack.push(U256::zero()).unwrap();
		stack.push(U256::MAX).unwrap();
		assert_eq!(sha3(&stack), Ok(None));
	}

	#[test]
	fn overflowing_region_faults() {
		let mut stack = Stack::new(1024);
		stack.push(U256::MAX).unwrap();
		assert_eq!(mload(&stack), Err(ExitError::GasUintOverflow));
	}

	#[test]
	fn call_takes_larger_window() {
		// gas, to, value, in_offset, in_len, out_offset, out_len
		let stack = stack_of(&[0, 0, 0, 64, 32, 0, 16]);
		assert_eq!(call(&stack), Ok(Some(U256::from(96))));

		let stack = stack_of(&[0, 0, 0, 0, 0, 200, 1]);
		assert_eq!(call(&stack), Ok(Some(U256::from(201))));
	}
}
