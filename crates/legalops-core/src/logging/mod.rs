//! Structured logging setup with `tracing`.
//!
//! Every crate in the workspace logs through `tracing` macros with structured
//! fields (`module`, `event`, `linkage_id`, ...). The binary installs a
//! subscriber once at startup through [`init_subscriber`] or
//! [`init_json_subscriber`]; `RUST_LOG` overrides the configured level.
//!
//! [`capture_logs`] installs a thread-local capture layer for asserting on
//! log output in tests.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

use tracing_subscriber::EnvFilter;

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install a human-readable subscriber on stderr.
///
/// Call once at startup. Later calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails only if a global subscriber is already set
    let _ = subscriber.try_init();
}

/// Install a JSON-lines subscriber on stderr for log shipping.
///
/// Call once at startup. Later calls are no-ops.
pub fn init_json_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .json();

    let _ = subscriber.try_init();
}
