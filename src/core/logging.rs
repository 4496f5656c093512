//! Diagnostic logging to stderr.
//!
//! Filtered by `STASH_LOG` (an `EnvFilter` directive such as `debug` or
//! `stash=trace`), defaulting to warnings only. Stdout is reserved for values.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STASH_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
