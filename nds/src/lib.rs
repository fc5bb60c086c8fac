//! Benchmark-harness driver for NDS, a TPC-DS derived decision-support benchmark.
//!
//! The driver generates data and query streams with the TPC-DS toolchain,
//! converts raw data to a columnar format through an engine submission
//! template, and executes query streams as a power run (one stream) or a
//! throughput run (many streams concurrently). The architecture separates:
//!
//! - **[`core`]**: Pure logic (stream sets, log naming, flag lists, outcome
//!   aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, process execution,
//!   toolchain staging, filesystem layout).
//!
//! Orchestration modules ([`coordinator`], [`generate`], [`convert`]) combine
//! the two to implement CLI commands.

pub mod convert;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
