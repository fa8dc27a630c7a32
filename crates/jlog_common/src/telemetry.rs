//! Internal diagnostics initialization
//!
//! jlog reports its own problems (failed sink writes, config fallbacks) through `tracing`.
//! These diagnostics always go to stderr and never mix with the JSON log lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the diagnostics subscriber
///
/// # Arguments
/// * `verbose` - If true, sets the filter to DEBUG, otherwise WARN
/// * `json_format` - If true, outputs diagnostics as JSON for machine parsing
///
/// Returns `false` when a global subscriber was already installed.
///
/// # Example
/// ```
/// jlog_common::telemetry::init_tracing(false, false);
/// tracing::warn!("sink unavailable");
/// ```
pub fn init_tracing(verbose: bool, json_format: bool) -> bool {
    let filter_level = if verbose { "debug" } else { "warn" };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_level));

    if json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .with(env_filter)
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        // Only the first installation in this test binary can win.
        let first = init_tracing(false, false);
        let second = init_tracing(true, true);
        assert!(!(first && second));
    }
}
