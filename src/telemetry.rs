//! Log setup for the binary.
//!
//! Logs go to stderr so stdout carries only the run report. The level comes
//! from `RUST_LOG` and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=info pizza-checkout script.csv
//! ```

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
