//! Foundational low-level utilities shared across Havoc crates.
//!
//! Provides wall-clock helpers used by offense-history expiry and engine
//! telemetry, plus process-unique id minting for moderation actions.

pub mod ids;
pub mod time_utils;

pub use ids::next_action_id;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms, is_expired_unix};
