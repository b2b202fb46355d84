//! Boundary traits for the engine's external collaborators.
//!
//! The Twitch client, persistence, and chat delivery live behind these
//! contracts; the engine invokes them without holding any internal lock and
//! never retries a failed call.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::ModeratorIdentity;
use crate::inventory::{InventorySnapshot, ItemKind};
use crate::outcome::ActionOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Result of one moderation API timeout call.
pub enum ModerationReceipt {
    Applied,
    Rejected { code: String },
}

#[async_trait]
/// Trait contract for the moderation timeout API.
pub trait ModerationApi: Send + Sync {
    /// Applies a timeout; a non-OK provider result is a `Rejected` receipt,
    /// a transport failure an error. Neither is retried by the engine.
    async fn apply_timeout(
        &self,
        channel_id: &str,
        target_user_id: &str,
        moderator: &ModeratorIdentity,
        duration_seconds: u64,
    ) -> Result<ModerationReceipt>;
}

#[async_trait]
/// Offense history repository consulted by the escalation evaluator.
///
/// The TTL reset policy is configured on the repository itself; an expired
/// entry reads as zero.
pub trait OffenseHistory: Send + Sync {
    async fn offense_count(&self, chatter_id: &str, channel_id: &str) -> Result<u64>;

    /// Records one attempt and returns the updated count.
    async fn record_offense(&self, chatter_id: &str, channel_id: &str) -> Result<u64>;
}

#[async_trait]
/// Atomic per-chatter item count store.
pub trait InventoryLedger: Send + Sync {
    async fn snapshot(&self, chatter_id: &str, channel_id: &str) -> Result<InventorySnapshot>;

    /// Removes one unit, clamped at zero, returning the fresh snapshot.
    async fn decrement(
        &self,
        item: ItemKind,
        chatter_id: &str,
        channel_id: &str,
    ) -> Result<InventorySnapshot>;

    /// Adds one unit, returning the fresh snapshot.
    async fn increment(
        &self,
        item: ItemKind,
        chatter_id: &str,
        channel_id: &str,
    ) -> Result<InventorySnapshot>;
}

#[async_trait]
/// Reports whether a channel's stream is currently live.
pub trait StreamStatusSource: Send + Sync {
    async fn is_live(&self, channel_id: &str) -> Result<bool>;
}

#[async_trait]
/// Single registered consumer of outcome events.
pub trait OutcomeListener: Send + Sync {
    async fn on_outcome(&self, outcome: &ActionOutcome) -> Result<()>;
}
