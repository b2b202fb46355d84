//! Virtual inventory item kinds and copy-on-write snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `ItemKind` values.
pub enum ItemKind {
    Grenade,
    Banana,
    CassetteTape,
    AirStrike,
    Tm36,
}

impl ItemKind {
    /// Returns the stable snake_case wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grenade => "grenade",
            Self::Banana => "banana",
            Self::CassetteTape => "cassette_tape",
            Self::AirStrike => "air_strike",
            Self::Tm36 => "tm36",
        }
    }
}

/// Immutable per-chatter item counts.
///
/// Every mutation produces a new snapshot; an already-returned snapshot is
/// never edited in place, so listeners can report remaining stock without a
/// second ledger round-trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventorySnapshot {
    counts: BTreeMap<ItemKind, u64>,
}

impl InventorySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding used by tests and ledger bootstrap.
    pub fn with_count(mut self, item: ItemKind, count: u64) -> Self {
        if count == 0 {
            self.counts.remove(&item);
        } else {
            self.counts.insert(item, count);
        }
        self
    }

    /// Returns the count for one item kind, zero when absent.
    pub fn count(&self, item: ItemKind) -> u64 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    /// Returns a new snapshot with one more unit of `item`.
    pub fn incremented(&self, item: ItemKind) -> Self {
        let mut next = self.clone();
        let count = next.counts.entry(item).or_insert(0);
        *count = count.saturating_add(1);
        next
    }

    /// Returns a new snapshot with one unit of `item` removed, clamped at zero.
    pub fn decremented(&self, item: ItemKind) -> Self {
        let mut next = self.clone();
        match next.counts.get_mut(&item) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                next.counts.remove(&item);
            }
            None => {}
        }
        next
    }

    /// Returns true when no item has stock.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_clamps_at_zero_and_never_goes_negative() {
        let snapshot = InventorySnapshot::new().with_count(ItemKind::Grenade, 1);
        let once = snapshot.decremented(ItemKind::Grenade);
        let twice = once.decremented(ItemKind::Grenade);
        let thrice = twice.decremented(ItemKind::Grenade);
        assert_eq!(once.count(ItemKind::Grenade), 0);
        assert_eq!(twice.count(ItemKind::Grenade), 0);
        assert_eq!(thrice.count(ItemKind::Grenade), 0);
    }

    #[test]
    fn mutation_is_copy_on_write() {
        let original = InventorySnapshot::new().with_count(ItemKind::Banana, 2);
        let mutated = original.decremented(ItemKind::Banana);
        assert_eq!(original.count(ItemKind::Banana), 2);
        assert_eq!(mutated.count(ItemKind::Banana), 1);

        let grown = original.incremented(ItemKind::CassetteTape);
        assert_eq!(original.count(ItemKind::CassetteTape), 0);
        assert_eq!(grown.count(ItemKind::CassetteTape), 1);
    }

    #[test]
    fn item_kind_wire_names_are_stable() {
        assert_eq!(ItemKind::Grenade.as_str(), "grenade");
        assert_eq!(ItemKind::CassetteTape.as_str(), "cassette_tape");
        assert_eq!(ItemKind::Tm36.as_str(), "tm36");
    }
}
