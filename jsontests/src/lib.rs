//! JSON state-test runner for homestead-evm.
//!
//! Each test gives a pre state, one message and the expected outcome of
//! applying it: a rejection, or the failed flag, used gas, return data and
//! post state of the accounts it lists.

pub mod error;
pub mod run;
pub mod types;
