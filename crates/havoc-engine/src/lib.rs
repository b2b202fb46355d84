//! Action/event processing engine for chat moderation games.
//!
//! One engine instance owns a bounded action queue drained by a single
//! background worker and a bounded outcome queue drained by a single
//! dispatcher, with duration sampling, dice-roll escalation, and virtual
//! inventory consumption layered onto the worker. Delivery is at-most-once
//! and best-effort; a full queue drops rather than grows.

pub mod action;
pub mod boundaries;
pub mod config;
pub mod duration;
pub mod engine;
pub mod escalation;
pub mod health;
pub mod inventory;
pub mod memory;
pub mod outcome;
pub mod queue;

pub use action::{
    ActionKind, ActionValidationError, ModerationAction, ModeratorIdentity, StreamRequirement,
};
pub use boundaries::{
    InventoryLedger, ModerationApi, ModerationReceipt, OffenseHistory, OutcomeListener,
    StreamStatusSource,
};
pub use config::EngineConfig;
pub use duration::{
    format_duration_label, sample_duration, sample_duration_with, DurationSpec, SampledDuration,
};
pub use engine::{ActionEngine, EngineCollaborators};
pub use escalation::{failure_probability, EscalationConfig, EscalationVerdict};
pub use health::EngineHealthSnapshot;
pub use inventory::{InventorySnapshot, ItemKind};
pub use memory::{MemoryInventoryLedger, MemoryOffenseHistory, MemoryStreamStatus};
pub use outcome::{ActionOutcome, DiceRollDetail};
pub use queue::BoundedQueue;
