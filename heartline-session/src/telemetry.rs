//! Tracing subscriber bootstrap.
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used. Safe to
//! call more than once: later calls leave the first subscriber in place.

use tracing_subscriber::EnvFilter;

use heartline_core::config::GeneralConfig;

/// Install the global subscriber described by `config`.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
