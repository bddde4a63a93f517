//! Log setup for the CLI.
//!
//! Events go to stderr so stdout carries only the JSON summary. `RUST_LOG`
//! wins when set; otherwise the level is `info`, or `debug` with `-v`.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
