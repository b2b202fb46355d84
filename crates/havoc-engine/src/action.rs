//! Moderation action model and construction-time validation.
//!
//! An action is created by a command or redemption handler, validated once,
//! then submitted into the engine where it is consumed exactly once by the
//! worker loop. Validation failure is the only error class that ever
//! propagates back to the producing caller.

use havoc_core::next_action_id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::DurationSpec;
use crate::inventory::ItemKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Enumerates supported `ActionValidationError` values.
pub enum ActionValidationError {
    #[error("instigating chatter id must be non-empty")]
    EmptyChatterId,
    #[error("channel id must be non-empty")]
    EmptyChannelId,
    #[error("moderator identity requires a user id and an access token")]
    IncompleteModerator,
    #[error("action kind '{kind}' requires a non-empty target chatter id")]
    MissingTarget { kind: &'static str },
    #[error("invalid duration spec: {detail}")]
    InvalidDuration { detail: String },
}

/// Moderator credential/identity pair attached to every action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeratorIdentity {
    pub user_id: String,
    pub access_token: String,
}

impl ModeratorIdentity {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Stream-state precondition evaluated before an action may proceed.
pub enum StreamRequirement {
    #[default]
    Any,
    LiveOnly,
    OfflineOnly,
}

impl StreamRequirement {
    /// Returns the stable snake_case wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::LiveOnly => "live_only",
            Self::OfflineOnly => "offline_only",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Enumerates supported `ActionKind` values.
pub enum ActionKind {
    /// Plain timeout, no inventory and no dice roll.
    Basic {
        target_id: String,
        duration: DurationSpec,
    },
    /// Consumes one grenade and times out the target.
    Grenade {
        target_id: String,
        duration: DurationSpec,
    },
    /// Consumes one banana; the only family routed through escalation.
    Banana {
        target_id: String,
        duration: DurationSpec,
    },
    /// Consumes one air strike and times out the target.
    AirStrike {
        target_id: String,
        duration: DurationSpec,
    },
    /// Self-destruct: consumes one TM-36 and times out the instigator.
    Tm36 { duration: DurationSpec },
    /// Copy-message punishment timeout.
    CopyMessage {
        target_id: String,
        duration: DurationSpec,
    },
    /// Consumes one unit of an arbitrary item, no moderation call.
    UseItem { item: ItemKind },
    /// Moves one unit of an item from the instigator to the target.
    TradeItem {
        target_id: String,
        item: ItemKind,
    },
}

impl ActionKind {
    /// Returns the stable snake_case kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Grenade { .. } => "grenade",
            Self::Banana { .. } => "banana",
            Self::AirStrike { .. } => "air_strike",
            Self::Tm36 { .. } => "tm36",
            Self::CopyMessage { .. } => "copy_message",
            Self::UseItem { .. } => "use_item",
            Self::TradeItem { .. } => "trade_item",
        }
    }

    /// Returns the inventory item this kind consumes, when any.
    pub fn consumed_item(&self) -> Option<ItemKind> {
        match self {
            Self::Grenade { .. } => Some(ItemKind::Grenade),
            Self::Banana { .. } => Some(ItemKind::Banana),
            Self::AirStrike { .. } => Some(ItemKind::AirStrike),
            Self::Tm36 { .. } => Some(ItemKind::Tm36),
            Self::UseItem { item } => Some(*item),
            Self::TradeItem { item, .. } => Some(*item),
            Self::Basic { .. } | Self::CopyMessage { .. } => None,
        }
    }

    /// Returns the explicit target chatter id, when the kind carries one.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Basic { target_id, .. }
            | Self::Grenade { target_id, .. }
            | Self::Banana { target_id, .. }
            | Self::AirStrike { target_id, .. }
            | Self::CopyMessage { target_id, .. }
            | Self::TradeItem { target_id, .. } => Some(target_id.as_str()),
            Self::Tm36 { .. } | Self::UseItem { .. } => None,
        }
    }

    /// Returns the duration spec for timeout kinds.
    pub fn duration(&self) -> Option<&DurationSpec> {
        match self {
            Self::Basic { duration, .. }
            | Self::Grenade { duration, .. }
            | Self::Banana { duration, .. }
            | Self::AirStrike { duration, .. }
            | Self::Tm36 { duration }
            | Self::CopyMessage { duration, .. } => Some(duration),
            Self::UseItem { .. } | Self::TradeItem { .. } => None,
        }
    }

    fn requires_target(&self) -> bool {
        matches!(
            self,
            Self::Basic { .. }
                | Self::Grenade { .. }
                | Self::Banana { .. }
                | Self::AirStrike { .. }
                | Self::CopyMessage { .. }
                | Self::TradeItem { .. }
        )
    }
}

/// Immutable moderation intent, submitted once and consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationAction {
    pub action_id: String,
    pub chatter_id: String,
    pub moderator: ModeratorIdentity,
    pub channel_id: String,
    #[serde(default)]
    pub reply_message_id: Option<String>,
    #[serde(default)]
    pub stream_requirement: StreamRequirement,
    pub kind: ActionKind,
}

impl ModerationAction {
    /// Builds a validated action with a freshly minted id.
    pub fn new(
        chatter_id: impl Into<String>,
        moderator: ModeratorIdentity,
        channel_id: impl Into<String>,
        kind: ActionKind,
    ) -> Result<Self, ActionValidationError> {
        let action = Self {
            action_id: next_action_id(),
            chatter_id: chatter_id.into(),
            moderator,
            channel_id: channel_id.into(),
            reply_message_id: None,
            stream_requirement: StreamRequirement::Any,
            kind,
        };
        action.validate()?;
        Ok(action)
    }

    /// Attaches the chat message id this action replies to.
    pub fn with_reply_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.reply_message_id = Some(message_id.into());
        self
    }

    /// Restricts the action to a stream state.
    pub fn with_stream_requirement(mut self, requirement: StreamRequirement) -> Self {
        self.stream_requirement = requirement;
        self
    }

    fn validate(&self) -> Result<(), ActionValidationError> {
        if self.chatter_id.trim().is_empty() {
            return Err(ActionValidationError::EmptyChatterId);
        }
        if self.channel_id.trim().is_empty() {
            return Err(ActionValidationError::EmptyChannelId);
        }
        if self.moderator.user_id.trim().is_empty() || self.moderator.access_token.trim().is_empty()
        {
            return Err(ActionValidationError::IncompleteModerator);
        }
        if self.kind.requires_target()
            && self
                .kind
                .target_id()
                .map(str::trim)
                .is_none_or(str::is_empty)
        {
            return Err(ActionValidationError::MissingTarget {
                kind: self.kind.as_str(),
            });
        }
        if let Some(duration) = self.kind.duration() {
            duration
                .validate()
                .map_err(|error| ActionValidationError::InvalidDuration {
                    detail: error.to_string(),
                })?;
        }
        Ok(())
    }
}
