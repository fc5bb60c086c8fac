//! Tracing setup for the `nds` binary.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: driver diagnostics via `RUST_LOG`, output to stderr.
//! - **Run logs**: engine output teed to per-stream files by `io::process`.
//!   Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `info` if unset.
/// Output: stderr, compact format, with thread names so concurrent streams
/// can be told apart.
///
/// # Example
/// ```bash
/// RUST_LOG=nds=debug nds run throughput --query-stream a.sql,b.sql ...
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .compact(),
        )
        .init();
}
