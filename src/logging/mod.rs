//! Structured logging setup.
//!
//! Builds tracing filter directives from the [`LoggingConfig`] and installs
//! the global subscriber in the configured format.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level and any
/// component-specific log levels, e.g. `"info,flowforge_console::reconcile=debug"`.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter_str.push_str(&format!(",flowforge_console::{}={}", component, level));
        }
    }

    filter_str
}

/// Install the global tracing subscriber. RUST_LOG wins over the config when
/// set. Safe to call once per process; later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(config)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    // Tests and repeated CLI invocations may have a subscriber already
    let _ = result;
}
