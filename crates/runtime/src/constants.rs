// Runtime constants (no magic values)
use std::time::Duration;

/// Back-off before re-submitting an event the queue rejected as saturated (25ms)
pub const SATURATION_BACKOFF: Duration = Duration::from_millis(25);

/// Environment variable selecting the log format (`json` or `pretty`)
pub const LOG_FORMAT_ENV: &str = "DISPATCHQ_LOG_FORMAT";

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "dispatchq=info";

/// Message used when a panic payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC: &str = "Unknown panic";
