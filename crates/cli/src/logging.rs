//! Log subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the verbosity flags.
/// Format: `CALLBILL_LOG=callbill_recon=debug,callbill_io=info`
pub const LOG_ENV: &str = "CALLBILL_LOG";

/// Directive used when `CALLBILL_LOG` is unset or invalid.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

/// Install the stderr subscriber. `log` records from the library crates are
/// forwarded through the same filter. Safe to call more than once.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose > 1)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
