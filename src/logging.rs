//! Logging initialization.
//!
//! Log lines go to stderr through a `tracing-subscriber` formatter. The
//! `TRAFFIC_LIGHT_LOG` environment variable takes precedence over the
//! verbosity passed by the caller, e.g. `TRAFFIC_LIGHT_LOG=traffic_light=trace`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an [`EnvFilter`] directive.
pub const LOG_ENV_VAR: &str = "TRAFFIC_LIGHT_LOG";

/// Maps a verbosity level to a tracing directive string.
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"` (saturates)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global tracing subscriber.
///
/// Uses `try_init()`, so calling this more than once (e.g. in tests) is safe.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn verbosity_mapping() {
        check!(verbosity_to_directive(0) == "warn");
        check!(verbosity_to_directive(1) == "info");
        check!(verbosity_to_directive(2) == "debug");
        check!(verbosity_to_directive(3) == "trace");
        check!(verbosity_to_directive(u8::MAX) == "trace");
    }

    #[test]
    fn init_logging_does_not_panic() {
        init_logging(0);
        init_logging(3);
    }
}
