//! Engine health counters and reason codes for operator inspection.

use havoc_core::current_unix_timestamp_ms;
use serde::{Deserialize, Serialize};

pub const REASON_ACTION_SUBMITTED: &str = "action_submitted";
pub const REASON_ACTION_DROPPED: &str = "action_dropped";
pub const REASON_ACTION_PROCESSED: &str = "action_processed";
pub const REASON_ACTION_FAILED: &str = "action_processing_failed";
pub const REASON_EVENT_EMITTED: &str = "event_emitted";
pub const REASON_EVENT_DROPPED: &str = "event_dropped";
pub const REASON_EVENT_DISPATCHED: &str = "event_dispatched";
pub const REASON_LISTENER_FAILED: &str = "listener_failed";
pub const REASON_WORKER_STARTED: &str = "worker_started";
pub const REASON_WORKER_ALREADY_RUNNING: &str = "worker_already_running";

const RECENT_REASON_CODE_CAP: usize = 16;

/// Runtime counters snapshot; all totals saturate instead of wrapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineHealthSnapshot {
    #[serde(default)]
    pub updated_unix_ms: u64,
    #[serde(default)]
    pub action_queue_depth: usize,
    #[serde(default)]
    pub event_queue_depth: usize,
    #[serde(default)]
    pub submitted_total: u64,
    #[serde(default)]
    pub dropped_actions_total: u64,
    #[serde(default)]
    pub processed_total: u64,
    #[serde(default)]
    pub action_failures_total: u64,
    #[serde(default)]
    pub events_emitted_total: u64,
    #[serde(default)]
    pub events_dropped_total: u64,
    #[serde(default)]
    pub events_dispatched_total: u64,
    #[serde(default)]
    pub listener_failures_total: u64,
    #[serde(default)]
    pub last_action_id: String,
    #[serde(default)]
    pub last_reason_code: String,
    #[serde(default)]
    pub recent_reason_codes: Vec<String>,
}

impl EngineHealthSnapshot {
    pub(crate) fn note(&mut self, action_id: Option<&str>, reason_code: &str) {
        self.updated_unix_ms = current_unix_timestamp_ms();
        if let Some(action_id) = action_id {
            self.last_action_id = action_id.to_string();
        }
        self.last_reason_code = reason_code.to_string();
        push_recent_line(
            &mut self.recent_reason_codes,
            reason_code.to_string(),
            RECENT_REASON_CODE_CAP,
        );
    }
}

fn push_recent_line(lines: &mut Vec<String>, line: String, cap: usize) {
    lines.push(line);
    while lines.len() > cap {
        lines.remove(0);
    }
}
