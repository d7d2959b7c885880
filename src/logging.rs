//! Tracing setup for the binary. Logs go to stderr so quiz output on stdout
//! stays clean.

use tracing_subscriber::{EnvFilter, fmt};

const CRATE_TARGET: &str = "lexiquiz_rs";

/// Maps `-v` counts to a default filter directive.
fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("{CRATE_TARGET}={level}")
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
