use crate::logging::LogFormat;
use crate::scheduling::PollMode;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default long-poll wait, in seconds, for each receive call.
pub const DEFAULT_WAIT_SECONDS: u64 = 10;

/// Default pause, in milliseconds, after a failed receive.
pub const DEFAULT_RECEIVE_FAILURE_BACKOFF_MS: u64 = 1_000;

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default long-poll wait in seconds.
pub fn default_wait_seconds() -> u64 {
    DEFAULT_WAIT_SECONDS
}

/// Default receive failure backoff in milliseconds.
pub fn default_receive_failure_backoff_ms() -> u64 {
    DEFAULT_RECEIVE_FAILURE_BACKOFF_MS
}

/// Clients are polled in turn unless configured otherwise.
pub fn default_poll_mode() -> PollMode {
    PollMode::Sequential
}
