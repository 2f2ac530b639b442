use crate::prelude::*;
use crate::{Memory, Opcode, Stack, Valids};
use core::ops::Range;

/// Per-frame interpreter state: the code being run, its input, the program
/// counter, the operand stack and the linear memory.
#[derive(Clone, Debug)]
pub struct Machine {
	/// Program data.
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter.
	position: usize,
	/// Return value, as a memory range.
	return_range: Range<usize>,
	/// Code validity maps.
	valids: Valids,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
}

impl Machine {
	/// Create a new machine with given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: 0,
			return_range: 0..0,
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Reference of machine stack.
	#[must_use]
	pub const fn stack(&self) -> &Stack {
		&self.stack
	}

	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}

	/// Reference of machine memory.
	#[must_use]
	pub const fn memory(&self) -> &Memory {
		&self.memory
	}

	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}

	/// Machine code.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Call data of the frame.
	#[must_use]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Current program counter.
	#[inline]
	#[must_use]
	pub const fn position(&self) -> usize {
		self.position
	}

	/// Opcode at the program counter, `None` once past the end of the code.
	#[inline]
	#[must_use]
	pub fn opcode(&self) -> Option<Opcode> {
		self.code.get(self.position).map(|v| Opcode(*v))
	}

	/// Move the program counter to an explicit position.
	#[inline]
	pub fn set_position(&mut self, position: usize) {
		self.position = position;
	}

	/// Move the program counter forward by `n` bytes.
	#[inline]
	pub fn advance(&mut self, n: usize) {
		self.position = self.position.saturating_add(n);
	}

	/// Whether `position` is a `JUMPDEST` outside of push data.
	#[inline]
	#[must_use]
	pub fn is_valid_jump(&self, position: usize) -> bool {
		self.valids.is_valid(position)
	}

	/// Record the memory range returned by the frame.
	pub fn set_return_range(&mut self, range: Range<usize>) {
		self.return_range = range;
	}

	/// Copy and get the return value of the machine, if any.
	#[must_use]
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.is_empty() {
			return Vec::new();
		}
		self.memory
			.get(self.return_range.start, self.return_range.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::STACK_LIMIT;

	#[test]
	fn opcode_is_none_past_end_of_code() {
		let mut machine = Machine::new(
			Rc::new(vec![0x60, 0x01]),
			Rc::new(Vec::new()),
			STACK_LIMIT,
			usize::MAX,
		);
		assert_eq!(machine.opcode(), Some(Opcode::PUSH1));
		machine.advance(2);
		assert_eq!(machine.opcode(), None);
	}

	#[test]
	fn return_value_reads_memory_range() {
		let mut machine = Machine::new(
			Rc::new(Vec::new()),
			Rc::new(Vec::new()),
			STACK_LIMIT,
			usize::MAX,
		);
		machine.memory_mut().resize_end(32).unwrap();
		machine.memory_mut().set(4, &[1, 2, 3], None).unwrap();
		machine.set_return_range(4..8);
		assert_eq!(machine.return_value(), vec![1, 2, 3, 0]);
	}
}
