//! Download retry policy.

use std::time::Duration;

/// Fixed part of every backoff wait.
pub const BASE_WAIT: Duration = Duration::from_secs(3);

/// Attempts made when the caller does not choose.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Wait before retry `attempt` (0-indexed): `base + 2^attempt` seconds.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_add(Duration::from_secs(2u64.saturating_pow(attempt)))
}
