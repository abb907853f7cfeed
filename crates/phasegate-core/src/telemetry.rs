//! Tracing setup driven by the `[logging]` config table.
//!
//! The binary calls [`init_tracing`] once at start-up. Only the first call
//! installs a subscriber; later calls return `false` and change nothing.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Filter for the global subscriber. `RUST_LOG` wins over `config.level`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level().as_str()))
}

/// Install the global subscriber: JSON lines when `config.json`, plain text
/// otherwise. Returns whether this call installed it.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let output = if config.json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(output.with_filter(env_filter(config)))
        .try_init()
        .is_ok()
}
