//! Tracing initialization.

use std::io::IsTerminal;
use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `CBRIDGE_LOG=cbridge=debug`.
pub const LOG_ENV: &str = "CBRIDGE_LOG";

static INIT: Once = Once::new();

/// Default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "cbridge=warn",
        1 => "cbridge=info",
        2 => "cbridge=debug",
        _ => "cbridge=trace",
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so stdout only carries the result line. `CBRIDGE_LOG`
/// overrides the verbosity-derived filter. Calling this more than once is a
/// no-op.
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}
