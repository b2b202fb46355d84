//! In-memory reference collaborators for tests and local wiring.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use havoc_core::{current_unix_timestamp, is_expired_unix};

use crate::boundaries::{InventoryLedger, OffenseHistory, StreamStatusSource};
use crate::inventory::{InventorySnapshot, ItemKind};
use crate::queue::lock_unpoisoned;

fn scope_key(chatter_id: &str, channel_id: &str) -> (String, String) {
    (chatter_id.to_string(), channel_id.to_string())
}

/// Mutex-guarded inventory ledger keyed by (chatter, channel).
#[derive(Debug, Default)]
pub struct MemoryInventoryLedger {
    state: Mutex<HashMap<(String, String), InventorySnapshot>>,
}

impl MemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one chatter's stock, replacing any existing snapshot.
    pub fn seed(&self, chatter_id: &str, channel_id: &str, snapshot: InventorySnapshot) {
        let mut state = lock_unpoisoned(&self.state);
        state.insert(scope_key(chatter_id, channel_id), snapshot);
    }
}

#[async_trait]
impl InventoryLedger for MemoryInventoryLedger {
    async fn snapshot(&self, chatter_id: &str, channel_id: &str) -> Result<InventorySnapshot> {
        let state = lock_unpoisoned(&self.state);
        Ok(state
            .get(&scope_key(chatter_id, channel_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn decrement(
        &self,
        item: ItemKind,
        chatter_id: &str,
        channel_id: &str,
    ) -> Result<InventorySnapshot> {
        let mut state = lock_unpoisoned(&self.state);
        let entry = state.entry(scope_key(chatter_id, channel_id)).or_default();
        *entry = entry.decremented(item);
        Ok(entry.clone())
    }

    async fn increment(
        &self,
        item: ItemKind,
        chatter_id: &str,
        channel_id: &str,
    ) -> Result<InventorySnapshot> {
        let mut state = lock_unpoisoned(&self.state);
        let entry = state.entry(scope_key(chatter_id, channel_id)).or_default();
        *entry = entry.incremented(item);
        Ok(entry.clone())
    }
}

#[derive(Debug, Clone, Copy)]
struct OffenseEntry {
    count: u64,
    last_offense_unix: u64,
}

/// Offense history with a TTL after which a chatter's count reads as zero.
#[derive(Debug)]
pub struct MemoryOffenseHistory {
    ttl_seconds: u64,
    state: Mutex<HashMap<(String, String), OffenseEntry>>,
}

impl MemoryOffenseHistory {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            state: Mutex::new(HashMap::new()),
        }
    }

    fn live_count(&self, entry: Option<&OffenseEntry>, now_unix: u64) -> u64 {
        match entry {
            Some(entry)
                if !is_expired_unix(
                    Some(entry.last_offense_unix.saturating_add(self.ttl_seconds)),
                    now_unix,
                ) =>
            {
                entry.count
            }
            _ => 0,
        }
    }
}

#[async_trait]
impl OffenseHistory for MemoryOffenseHistory {
    async fn offense_count(&self, chatter_id: &str, channel_id: &str) -> Result<u64> {
        let now = current_unix_timestamp();
        let state = lock_unpoisoned(&self.state);
        Ok(self.live_count(state.get(&scope_key(chatter_id, channel_id)), now))
    }

    async fn record_offense(&self, chatter_id: &str, channel_id: &str) -> Result<u64> {
        let now = current_unix_timestamp();
        let mut state = lock_unpoisoned(&self.state);
        let key = scope_key(chatter_id, channel_id);
        let count = self.live_count(state.get(&key), now).saturating_add(1);
        state.insert(
            key,
            OffenseEntry {
                count,
                last_offense_unix: now,
            },
        );
        Ok(count)
    }
}

/// Stream liveness source backed by an explicit per-channel flag.
#[derive(Debug, Default)]
pub struct MemoryStreamStatus {
    live: Mutex<HashMap<String, bool>>,
}

impl MemoryStreamStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live(&self, channel_id: &str, live: bool) {
        let mut state = lock_unpoisoned(&self.live);
        state.insert(channel_id.to_string(), live);
    }
}

#[async_trait]
impl StreamStatusSource for MemoryStreamStatus {
    async fn is_live(&self, channel_id: &str) -> Result<bool> {
        let state = lock_unpoisoned(&self.live);
        Ok(state.get(channel_id).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ledger_decrement_clamps_and_returns_fresh_snapshots() {
        let ledger = MemoryInventoryLedger::new();
        ledger.seed(
            "chatter-1",
            "channel-1",
            InventorySnapshot::new().with_count(ItemKind::Grenade, 1),
        );

        let first = ledger
            .decrement(ItemKind::Grenade, "chatter-1", "channel-1")
            .await
            .expect("decrement");
        assert_eq!(first.count(ItemKind::Grenade), 0);

        let second = ledger
            .decrement(ItemKind::Grenade, "chatter-1", "channel-1")
            .await
            .expect("decrement");
        assert_eq!(second.count(ItemKind::Grenade), 0);

        let grown = ledger
            .increment(ItemKind::Banana, "chatter-1", "channel-1")
            .await
            .expect("increment");
        assert_eq!(grown.count(ItemKind::Banana), 1);
    }

    #[tokio::test]
    async fn unknown_chatter_reads_an_empty_snapshot() {
        let ledger = MemoryInventoryLedger::new();
        let snapshot = ledger
            .snapshot("nobody", "channel-1")
            .await
            .expect("snapshot");
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn offense_history_accumulates_within_ttl() {
        let history = MemoryOffenseHistory::new(3_600);
        assert_eq!(
            history
                .offense_count("chatter-1", "channel-1")
                .await
                .expect("count"),
            0
        );
        assert_eq!(
            history
                .record_offense("chatter-1", "channel-1")
                .await
                .expect("record"),
            1
        );
        assert_eq!(
            history
                .record_offense("chatter-1", "channel-1")
                .await
                .expect("record"),
            2
        );
        assert_eq!(
            history
                .offense_count("chatter-1", "channel-2")
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn zero_ttl_resets_the_count_on_every_read() {
        let history = MemoryOffenseHistory::new(0);
        assert_eq!(
            history
                .record_offense("chatter-1", "channel-1")
                .await
                .expect("record"),
            1
        );
        assert_eq!(
            history
                .record_offense("chatter-1", "channel-1")
                .await
                .expect("record"),
            1
        );
        assert_eq!(
            history
                .offense_count("chatter-1", "channel-1")
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn stream_status_defaults_to_offline() {
        let status = MemoryStreamStatus::new();
        assert!(!status.is_live("channel-1").await.expect("is_live"));
        status.set_live("channel-1", true);
        assert!(status.is_live("channel-1").await.expect("is_live"));
    }
}
