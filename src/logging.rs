//! Logging bootstrap for sqlfront.
//!
//! Output is controlled by environment variables:
//!
//! - `SQLFRONT_DEBUG=true|1|yes` - enable debug logging
//! - `SQLFRONT_LOG_LEVEL=trace|debug|info|warn|error` - set the level explicitly
//! - `SQLFRONT_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Installing a subscriber needs the `tracing-subscriber` feature. Without
//! it, [`init`] does nothing and events go to whatever subscriber the
//! application installed.
//!
//! ```rust,no_run
//! sqlfront::logging::init();
//! ```
//!
//! Resolution failures are logged at `debug` with the failing key, forced
//! encryption at `warn`, and each batch dispatch runs inside a
//! `command_set.dispatch` span. Passwords are never logged.

use std::env;
use std::sync::Once;

/// Enables debug logging.
pub const DEBUG_VAR: &str = "SQLFRONT_DEBUG";
/// Selects the log level.
pub const LEVEL_VAR: &str = "SQLFRONT_LOG_LEVEL";
/// Selects the output format.
pub const FORMAT_VAR: &str = "SQLFRONT_LOG_FORMAT";

static INIT: Once = Once::new();

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Check if `SQLFRONT_DEBUG` asks for debug logging.
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).map(|v| truthy(&v)).unwrap_or(false)
}

/// Pick a level from raw `SQLFRONT_DEBUG` and `SQLFRONT_LOG_LEVEL` values.
///
/// An unrecognized level falls back as if none was given: `debug` when debug
/// is on, `warn` otherwise.
pub fn level_from(debug: Option<&str>, level: Option<&str>) -> &'static str {
    let explicit = level.and_then(|l| match l.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    });
    explicit.unwrap_or(if debug.is_some_and(truthy) { "debug" } else { "warn" })
}

/// Pick an output format from a raw `SQLFRONT_LOG_FORMAT` value.
pub fn format_from(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// The configured log level.
pub fn get_log_level() -> &'static str {
    level_from(env::var(DEBUG_VAR).ok().as_deref(), env::var(LEVEL_VAR).ok().as_deref())
}

/// The configured output format.
pub fn get_log_format() -> &'static str {
    format_from(env::var(FORMAT_VAR).ok().as_deref())
}

/// Directive string for the sqlfront crates at `level`.
pub fn filter_directives(level: &str) -> String {
    format!("sqlfront={level},sqlfront_options={level},sqlfront_batch={level}")
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Nothing is installed unless `SQLFRONT_DEBUG` or `SQLFRONT_LOG_LEVEL` is set.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directives(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            let installed = match get_log_format() {
                "pretty" => registry.with(fmt::layer().pretty()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().json()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = get_log_format(), "sqlfront logging initialized");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults() {
        assert_eq!(level_from(None, None), "warn");
        assert_eq!(level_from(Some("yes"), None), "debug");
        assert_eq!(level_from(Some("0"), None), "warn");
    }

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(level_from(Some("true"), Some("TRACE")), "trace");
        assert_eq!(level_from(None, Some("error")), "error");
        assert_eq!(level_from(Some("1"), Some("loud")), "debug");
        assert_eq!(level_from(None, Some("loud")), "warn");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_from(None), "json");
        assert_eq!(format_from(Some("Pretty")), "pretty");
        assert_eq!(format_from(Some("compact")), "compact");
        assert_eq!(format_from(Some("xml")), "json");
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(
            filter_directives("debug"),
            "sqlfront=debug,sqlfront_options=debug,sqlfront_batch=debug"
        );
    }
}
