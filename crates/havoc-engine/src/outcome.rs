//! Outcome events produced by the worker loop.
//!
//! Every outcome embeds its originating action, so a listener can format
//! chat replies or pick sounds without consulting any other state.

use serde::{Deserialize, Serialize};

use crate::action::{ModerationAction, StreamRequirement};
use crate::inventory::{InventorySnapshot, ItemKind};

/// Die roll and probability detail attached to banana-family outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiceRollDetail {
    pub die_size: u32,
    pub die_value: u32,
    pub offense_count: u64,
    pub failure_probability: f64,
    pub reversed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Enumerates supported `ActionOutcome` values.
pub enum ActionOutcome {
    /// The timeout landed on `target_id`.
    TimeoutApplied {
        action: ModerationAction,
        target_id: String,
        seconds: u64,
        duration_label: String,
        #[serde(default)]
        remaining_inventory: Option<InventorySnapshot>,
        #[serde(default)]
        dice: Option<DiceRollDetail>,
    },
    /// The reverse check fired; the instigator ate their own timeout.
    TimeoutReversed {
        action: ModerationAction,
        seconds: u64,
        duration_label: String,
        dice: DiceRollDetail,
        #[serde(default)]
        remaining_inventory: Option<InventorySnapshot>,
    },
    /// The failure draw fired; no timeout was applied.
    DiceRollFailed {
        action: ModerationAction,
        dice: DiceRollDetail,
    },
    /// The chatter had no stock of the required item.
    OutOfStock {
        action: ModerationAction,
        item: ItemKind,
    },
    /// The stream-state precondition did not hold.
    StreamStateMismatch {
        action: ModerationAction,
        required: StreamRequirement,
    },
    /// The moderation API returned a non-OK result code.
    ModerationRejected {
        action: ModerationAction,
        code: String,
    },
    /// One unit of an item was consumed without a moderation call.
    ItemConsumed {
        action: ModerationAction,
        item: ItemKind,
        remaining_inventory: InventorySnapshot,
    },
    /// One unit moved from the instigator to the target.
    ItemTraded {
        action: ModerationAction,
        item: ItemKind,
        giver_remaining: InventorySnapshot,
        receiver_remaining: InventorySnapshot,
    },
    /// Processing raised an error that has no more specific variant.
    ProcessingFailed {
        action: ModerationAction,
        detail: String,
    },
}

impl ActionOutcome {
    /// Returns the originating action for any outcome variant.
    pub fn action(&self) -> &ModerationAction {
        match self {
            Self::TimeoutApplied { action, .. }
            | Self::TimeoutReversed { action, .. }
            | Self::DiceRollFailed { action, .. }
            | Self::OutOfStock { action, .. }
            | Self::StreamStateMismatch { action, .. }
            | Self::ModerationRejected { action, .. }
            | Self::ItemConsumed { action, .. }
            | Self::ItemTraded { action, .. }
            | Self::ProcessingFailed { action, .. } => action,
        }
    }

    /// Returns the stable snake_case outcome name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeoutApplied { .. } => "timeout_applied",
            Self::TimeoutReversed { .. } => "timeout_reversed",
            Self::DiceRollFailed { .. } => "dice_roll_failed",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::StreamStateMismatch { .. } => "stream_state_mismatch",
            Self::ModerationRejected { .. } => "moderation_rejected",
            Self::ItemConsumed { .. } => "item_consumed",
            Self::ItemTraded { .. } => "item_traded",
            Self::ProcessingFailed { .. } => "processing_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ModeratorIdentity};
    use crate::duration::DurationSpec;

    #[test]
    fn every_outcome_exposes_its_originating_action() {
        let action = ModerationAction::new(
            "chatter-1",
            ModeratorIdentity::new("mod-1", "token-1"),
            "channel-1",
            ActionKind::Grenade {
                target_id: "target-1".to_string(),
                duration: DurationSpec::Exact { seconds: 30 },
            },
        )
        .expect("valid action");

        let outcome = ActionOutcome::OutOfStock {
            action: action.clone(),
            item: ItemKind::Grenade,
        };
        assert_eq!(outcome.action().action_id, action.action_id);
        assert_eq!(outcome.as_str(), "out_of_stock");
    }
}
