use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Returns the current Unix timestamp in milliseconds, saturating if the
/// millisecond count no longer fits in a u64.
pub fn current_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Returns true when `expires_unix` is set and already in the past.
pub fn is_expired_unix(expires_unix: Option<u64>, now_unix: u64) -> bool {
    match expires_unix {
        Some(expiry) => expiry <= now_unix,
        None => false,
    }
}
