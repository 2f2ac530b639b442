use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// `usize::MAX` as a `U256`.
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);
/// `u64::MAX` as a `U256`.
pub const U64_MAX: U256 = U256([u64::MAX, 0, 0, 0]);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Sign {
	Plus,
	Minus,
	Zero,
}

const SIGN_BIT_MASK: U256 = U256([
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0x7fff_ffff_ffff_ffff,
]);

/// Two's complement view of a `U256`, kept as sign and magnitude.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct I256(pub Sign, pub U256);

impl I256 {
	/// Zero value of I256.
	#[must_use]
	pub const fn zero() -> Self {
		Self(Sign::Zero, U256::zero())
	}

	/// Minimum value of I256, `-2^255`.
	#[must_use]
	pub fn min_value() -> Self {
		Self(Sign::Minus, (U256::MAX & SIGN_BIT_MASK) + U256::one())
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.0, other.0) {
			(Sign::Zero, Sign::Zero) => Ordering::Equal,
			(Sign::Zero | Sign::Minus, Sign::Plus) | (Sign::Minus, Sign::Zero) => Ordering::Less,
			(Sign::Plus, Sign::Zero | Sign::Minus) | (Sign::Zero, Sign::Minus) => {
				Ordering::Greater
			}
			(Sign::Minus, Sign::Minus) => self.1.cmp(&other.1).reverse(),
			(Sign::Plus, Sign::Plus) => self.1.cmp(&other.1),
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Default for I256 {
	fn default() -> Self {
		Self::zero()
	}
}

impl From<U256> for I256 {
	fn from(val: U256) -> Self {
		if val.is_zero() {
			Self::zero()
		} else if val & SIGN_BIT_MASK == val {
			Self(Sign::Plus, val)
		} else {
			Self(Sign::Minus, !val + U256::one())
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> Self {
		let sign = value.0;
		if sign == Sign::Zero {
			Self::zero()
		} else if sign == Sign::Plus {
			value.1
		} else {
			(!value.1).overflowing_add(Self::one()).0
		}
	}
}

impl Div for I256 {
	type Output = Self;

	fn div(self, other: Self) -> Self {
		if other == Self::zero() {
			return Self::zero();
		}

		if self == Self::min_value() && other.1 == U256::one() && other.0 == Sign::Minus {
			return Self::min_value();
		}

		let d = (self.1 / other.1) & SIGN_BIT_MASK;

		if d.is_zero() {
			return Self::zero();
		}

		match (self.0, other.0) {
			(Sign::Zero, Sign::Plus)
			| (Sign::Plus, Sign::Zero)
			| (Sign::Zero, Sign::Zero)
			| (Sign::Plus, Sign::Plus)
			| (Sign::Minus, Sign::Minus) => Self(Sign::Plus, d),
			(Sign::Zero, Sign::Minus)
			| (Sign::Plus, Sign::Minus)
			| (Sign::Minus, Sign::Zero)
			| (Sign::Minus, Sign::Plus) => Self(Sign::Minus, d),
		}
	}
}

impl Rem for I256 {
	type Output = Self;

	fn rem(self, other: Self) -> Self {
		if other.1.is_zero() {
			return Self::zero();
		}

		let r = (self.1 % other.1) & SIGN_BIT_MASK;

		if r.is_zero() {
			return Self::zero();
		}

		Self(self.0, r)
	}
}
