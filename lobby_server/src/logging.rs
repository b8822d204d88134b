//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `tracing-subscriber` installs
//! its `tracing-log` bridge on `init`, so those records land in the same
//! formatted output as the server's own spans and events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var. Consistency
/// faults are emitted on the `reconciliation` target, so
/// `RUST_LOG=info,reconciliation=error` isolates them.
///
/// # Example
///
/// ```no_run
/// use lobby_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use lobby_server::logging::log_security_event;
///
/// log_security_event("invalid_token", None, "/api/v1/wallet", "Bearer token rejected");
/// ```
pub fn log_security_event(event_type: &str, player_id: Option<i64>, path: &str, message: &str) {
    tracing::warn!(
        event_type = event_type,
        player_id = player_id,
        path = path,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic without a subscriber
        log_security_event("invalid_token", Some(1), "/ws", "Test message");
    }
}
