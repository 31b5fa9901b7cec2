use std::time::Duration;

/// Per-request timeout applied by the executor.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause between the writes and the final statement read of the validation scenario.
pub const VALIDATION_PAUSE: Duration = Duration::from_secs(1);

/// How often a ramping scenario re-evaluates its worker target.
pub const RAMP_TICK: Duration = Duration::from_millis(100);

/// Upper bound (inclusive) of a randomly generated transaction amount.
pub const MAX_AMOUNT: i64 = 10_000;

/// Length of randomly generated descriptions, also the API's maximum.
pub const DESCRIPTION_LEN: usize = 10;

/// Statuses the harness accepts as "input rejected".
pub const REJECTION_STATUSES: [u16; 2] = [422, 400];

pub const DEFAULT_BASE_URL: &str = "http://localhost:9999";

/// How long a finished ramping scenario waits for in-flight iterations before abandoning them.
pub const GRACEFUL_STOP: Duration = Duration::from_secs(30);
