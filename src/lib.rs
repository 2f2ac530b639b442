//! Frontier and Homestead Ethereum Virtual Machine, together with the state
//! transition that applies one message against a world state.
//!
//! The interpreter itself lives in the `core`, `runtime` and `gasometer`
//! crates, all re-exported here. This crate adds the pieces that run it over
//! accounts:
//!
//! - [`backend::WorldState`], the account ledger, and [`backend::MemoryState`];
//! - [`executor::stack::StackExecutor`], which charges gas and runs nested
//!   calls and creations;
//! - [`GasPool`] and [`apply_message`], the message state transition.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use evm_core::*;
pub use evm_gasometer as gasometer;
pub use evm_runtime::*;

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

pub mod backend;
pub mod executor;
mod gas_pool;
mod transition;

pub use crate::gas_pool::{GasPool, GasPoolError};
pub use crate::transition::{apply_message, ExecutionResult, Message, TransitionError};

mod prelude {
	pub use alloc::{
		collections::{BTreeMap, BTreeSet},
		rc::Rc,
		vec::Vec,
	};
}
