//! Tracing setup for the `bundleit` binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "bundleit=warn";
const VERBOSE_LOG_FILTER: &str = "bundleit=debug";

/// Filter used when `RUST_LOG` is unset or invalid.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}
