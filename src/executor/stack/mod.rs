//! A stack-based executor: every nested frame runs to completion before its
//! parent resumes, with its gas and state changes kept in a substate.

mod executor;

pub use self::executor::{StackExecutor, StackExitKind, StackSubstateMetadata};
