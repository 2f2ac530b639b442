//! # EVM executors
//!
//! Executors drive the interpreter over a world state: they run the top
//! level frame of a message and every nested call and creation it makes.

pub mod stack;
