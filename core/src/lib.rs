//! Core layer for the homestead-evm interpreter: opcodes, the operand stack,
//! linear memory and per-frame machine state.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod machine;
mod memory;
mod opcode;
mod stack;
pub mod utils;
mod valids;

pub use crate::error::{ExitError, ExitReason, ExitRevert, ExitSucceed};
pub use crate::machine::Machine;
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::{Stack, STACK_LIMIT};
pub use crate::valids::Valids;

mod prelude {
	pub use alloc::{borrow::Cow, rc::Rc, vec, vec::Vec};
}
