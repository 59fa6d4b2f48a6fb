//! Subprocess bridge: invocation construction, streaming execution and
//! failure classification

pub(crate) mod classify;
pub mod runner;

pub use runner::{GitCommand, RunOutcome, RunState};
