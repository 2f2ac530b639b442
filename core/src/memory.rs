use crate::prelude::*;
use crate::utils::USIZE_MAX;
use crate::ExitError;
use core::cmp::min;
use primitive_types::U256;

/// A sequential memory. It uses Rust's `Vec` for internal
/// representation. Its length is always a multiple of 32 bytes and it
/// never shrinks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
	data: Vec<u8>,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given limit.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Memory limit.
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// Get the length of the current memory range.
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Effective length, the value returned by `MSIZE`.
	#[must_use]
	pub fn effective_len(&self) -> usize {
		self.data.len()
	}

	/// Return true if current effective memory range is zero.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Return the full memory.
	#[must_use]
	pub const fn data(&self) -> &Vec<u8> {
		&self.data
	}

	/// Resize the memory to cover `offset..offset + len`. A zero-length
	/// access never grows memory.
	///
	/// # Errors
	/// Return `ExitError::InvalidRange` if `offset + len` overflows, or the
	/// errors of [`Self::resize_end`].
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		if len.is_zero() {
			return Ok(());
		}

		let end = offset.checked_add(len).ok_or(ExitError::InvalidRange)?;
		if end > USIZE_MAX {
			return Err(ExitError::InvalidRange);
		}
		self.resize_end(end.as_usize())
	}

	/// Resize the memory so that it covers `end` bytes, rounded up to a
	/// whole word.
	///
	/// # Errors
	/// Return `ExitError::InvalidRange` if rounding overflows, and
	/// `ExitError::OutOfGas` if the memory limit would be exceeded.
	pub fn resize_end(&mut self, end: usize) -> Result<(), ExitError> {
		if end <= self.data.len() {
			return Ok(());
		}

		let new_end = next_multiple_of_32(end).ok_or(ExitError::InvalidRange)?;
		if new_end > self.limit {
			return Err(ExitError::OutOfGas);
		}
		self.data.resize(new_end, 0);
		Ok(())
	}

	/// Get memory region at given offset. Bytes past the current length
	/// read as zero.
	#[must_use]
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = vec![0; size];
		if offset >= self.data.len() {
			return ret;
		}

		let end = min(offset.saturating_add(size), self.data.len());
		ret[..end - offset].copy_from_slice(&self.data[offset..end]);
		ret
	}

	/// Set memory region at given offset. The region must already be
	/// covered by the memory; growth always goes through a resize that
	/// has been paid for. When `target_size` exceeds the value length the
	/// rest of the region is zero-filled.
	///
	/// # Errors
	/// Return `ExitError::InvalidRange` if the region is not covered.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitError> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		let end = offset
			.checked_add(target_size)
			.ok_or(ExitError::InvalidRange)?;
		if end > self.data.len() {
			return Err(ExitError::InvalidRange);
		}

		let written = min(value.len(), target_size);
		self.data[offset..offset + written].copy_from_slice(&value[..written]);
		self.data[offset + written..end].fill(0);
		Ok(())
	}

	/// Copy `data` into the memory, as `CALLDATACOPY` and `CODECOPY` do.
	/// Source bytes beyond `data` read as zero.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` for offsets that do not fit a `usize`,
	/// or the errors of [`Self::set`].
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitError> {
		if len.is_zero() {
			return Ok(());
		}
		if memory_offset > USIZE_MAX || len > USIZE_MAX {
			return Err(ExitError::OutOfGas);
		}
		let memory_offset = memory_offset.as_usize();
		let ulen = len.as_usize();

		let data: &[u8] = if data_offset > USIZE_MAX {
			&[]
		} else {
			let data_offset = data_offset.as_usize();
			if data_offset >= data.len() {
				&[]
			} else {
				let end = min(data_offset.saturating_add(ulen), data.len());
				&data[data_offset..end]
			}
		};

		self.set(memory_offset, data, Some(ulen))
	}
}

/// Rounds up `x` to the closest multiple of 32. If `x % 32 == 0` then `x` is returned.
#[inline]
const fn next_multiple_of_32(x: usize) -> Option<usize> {
	let r = x & 31;
	if r == 0 {
		Some(x)
	} else {
		x.checked_add(32 - r)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resize_rounds_to_words_and_never_shrinks() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_end(1).unwrap();
		assert_eq!(memory.effective_len(), 32);
		memory.resize_end(33).unwrap();
		assert_eq!(memory.effective_len(), 64);
		memory.resize_end(10).unwrap();
		assert_eq!(memory.effective_len(), 64);
	}

	#[test]
	fn zero_length_access_does_not_grow() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_offset(U256::MAX, U256::zero()).unwrap();
		assert!(memory.is_empty());
		assert_eq!(
			memory.resize_offset(U256::MAX, U256::one()),
			Err(ExitError::InvalidRange)
		);
	}

	#[test]
	fn limit_is_enforced() {
		let mut memory = Memory::new(64);
		assert_eq!(memory.resize_end(65), Err(ExitError::OutOfGas));
		assert_eq!(memory.resize_end(64), Ok(()));
	}

	#[test]
	fn get_zero_pads_past_end() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_end(32).unwrap();
		memory.set(30, &[1, 2], None).unwrap();
		assert_eq!(memory.get(30, 4), vec![1, 2, 0, 0]);
		assert_eq!(memory.get(100, 2), vec![0, 0]);
	}

	#[test]
	fn set_requires_paid_region() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_end(32).unwrap();
		assert_eq!(memory.set(31, &[1, 2], None), Err(ExitError::InvalidRange));
		memory.set(0, &[0xff; 4], None).unwrap();
		memory.set(0, &[7], Some(3)).unwrap();
		assert_eq!(memory.get(0, 4), vec![7, 0, 0, 0xff]);
	}

	#[test]
	fn copy_large_zero_fills_beyond_source() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_end(32).unwrap();
		memory.set(0, &[0xaa; 32], None).unwrap();
		memory
			.copy_large(U256::zero(), U256::from(2), U256::from(4), &[1, 2, 3, 4])
			.unwrap();
		assert_eq!(memory.get(0, 5), vec![3, 4, 0, 0, 0xaa]);

		memory
			.copy_large(U256::from(8), U256::MAX, U256::from(2), &[1, 2, 3])
			.unwrap();
		assert_eq!(memory.get(8, 2), vec![0, 0]);
	}
}
