//! Reader path integration tests.
//!
//! Drives composed handlers directly through a capturing driver:
//! - What the caller's handler observes after the default behaviors
//! - Fan-out of `execute_task` per concurrency unit
//! - Retry bounded by the elapsed-time budget

mod support;
mod retry;
