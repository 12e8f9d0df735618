//! Logging setup for the provider binary.
//!
//! All logs are written to **stderr**: stdout carries the handshake line the
//! CLI reads to find the plugin's address.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `sentry_provider=debug`).
//!   When set it takes precedence over the `--log-level` flag.
//!
//! ```bash
//! # Trace the HTTP calls made to Sentry
//! RUST_LOG=sentry_provider::apiclient=debug ./terraform-provider-sentry
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when neither `RUST_LOG` nor a level is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build the filter: `RUST_LOG` if set, otherwise `default_level`.
///
/// An unparsable `default_level` falls back to [`DEFAULT_LOG_LEVEL`].
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Initialize logging with a custom default level.
///
/// Returns `false` if a global subscriber was already installed, which is
/// harmless when the provider is embedded in tests.
pub fn init_logging_with_default(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

/// Initialize logging at [`DEFAULT_LOG_LEVEL`].
pub fn init_logging() -> bool {
    init_logging_with_default(DEFAULT_LOG_LEVEL)
}
