use crate::utils::I256;
use primitive_types::U256;

#[inline]
pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.lt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.gt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn not(op1: U256) -> U256 {
	!op1
}

/// The `op1`-th byte of `op2`, counting from the most significant.
#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		let o = op1.as_usize();
		(op2 >> (8 * (31 - o))) & U256::from(0xff)
	} else {
		U256::zero()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signed_comparison() {
		assert_eq!(slt(U256::MAX, U256::zero()), U256::one());
		assert_eq!(sgt(U256::MAX, U256::zero()), U256::zero());
		assert_eq!(sgt(U256::one(), U256::MAX), U256::one());
	}

	#[test]
	fn byte_counts_from_most_significant() {
		let value = U256::from_big_endian(&[0xab; 1]) << 248;
		assert_eq!(byte(U256::zero(), value), U256::from(0xab));
		assert_eq!(byte(U256::from(31), U256::from(0xcd)), U256::from(0xcd));
		assert_eq!(byte(U256::from(32), U256::MAX), U256::zero());
	}
}
