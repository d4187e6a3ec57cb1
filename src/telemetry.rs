//! Tracing setup.
//!
//! Diagnostics go to stderr only; stdout is reserved for the reply envelope
//! the host parses. Verbosity is controlled with `RUST_LOG`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
