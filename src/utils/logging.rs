use serde::Serialize;
use tracing::debug;

/// Logs `value` as pretty JSON at debug level. Serialization is skipped
/// entirely when debug is off.
pub(crate) fn debug_pretty_json<T: Serialize>(label: &str, value: &T) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    debug!("{label}:\n{pretty_json}");
}
