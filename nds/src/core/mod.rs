//! Deterministic, pure logic shared by the driver.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (paths, flags, exit codes) and return deterministic outputs suitable
//! for tests.

pub mod flags;
pub mod layout;
pub mod outcome;
pub mod stream;
pub mod types;
