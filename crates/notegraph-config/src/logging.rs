//! Logging initialisation

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive.
///
/// Takes precedence over [`LoggingConfig::level`].
pub const ENV_LOG_FILTER: &str = "NOTEGRAPH_LOG";

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG_FILTER)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global `tracing` subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes it
/// safe to call from tests and embedders alike.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(config.with_target)
        .try_init()
        .is_ok()
}
