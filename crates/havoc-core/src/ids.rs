use std::sync::atomic::{AtomicU64, Ordering};

use crate::time_utils::current_unix_timestamp_ms;

const ACTION_ID_PREFIX: &str = "act";

static ACTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Mints a process-unique moderation action id.
///
/// Ids combine the wall clock with a monotonic counter so they stay unique
/// across an engine's lifetime even when many actions land in the same
/// millisecond.
pub fn next_action_id() -> String {
    let now = current_unix_timestamp_ms();
    let suffix = ACTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ACTION_ID_PREFIX}-{now}-{suffix:04}")
}
