//! The action engine: bounded queues, one worker loop, one dispatch loop.
//!
//! Producers submit validated actions; a single background worker drains
//! them in atomic per-tick batches and resolves each one against the
//! moderation API, inventory ledger, and offense history; outcome events
//! flow through a second bounded queue to the one registered listener.
//! Per-action state is one-way and terminal: submitted, then dropped or
//! batched, then processed, then its outcome emitted. Nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::action::{ActionKind, ModerationAction, StreamRequirement};
use crate::boundaries::{
    InventoryLedger, ModerationApi, ModerationReceipt, OffenseHistory, OutcomeListener,
    StreamStatusSource,
};
use crate::config::EngineConfig;
use crate::duration::{sample_duration, DurationSpec};
use crate::escalation::{self, EscalationVerdict};
use crate::health::{
    EngineHealthSnapshot, REASON_ACTION_DROPPED, REASON_ACTION_FAILED, REASON_ACTION_PROCESSED,
    REASON_ACTION_SUBMITTED, REASON_EVENT_DISPATCHED, REASON_EVENT_DROPPED, REASON_EVENT_EMITTED,
    REASON_LISTENER_FAILED, REASON_WORKER_ALREADY_RUNNING, REASON_WORKER_STARTED,
};
use crate::inventory::InventorySnapshot;
use crate::outcome::{ActionOutcome, DiceRollDetail};
use crate::queue::{lock_unpoisoned, BoundedQueue};

/// External collaborators wired into one engine instance.
#[derive(Clone)]
pub struct EngineCollaborators {
    pub moderation: Arc<dyn ModerationApi>,
    pub inventory: Arc<dyn InventoryLedger>,
    pub history: Arc<dyn OffenseHistory>,
    pub stream_status: Arc<dyn StreamStatusSource>,
}

struct EngineInner {
    config: EngineConfig,
    collaborators: EngineCollaborators,
    actions: BoundedQueue<ModerationAction>,
    events: BoundedQueue<ActionOutcome>,
    listener: Mutex<Option<Arc<dyn OutcomeListener>>>,
    health: Mutex<EngineHealthSnapshot>,
    worker_running: AtomicBool,
    dispatcher_running: AtomicBool,
}

enum TimeoutResolution {
    Applied {
        seconds: u64,
        duration_label: String,
        remaining_inventory: Option<InventorySnapshot>,
    },
    Rejected {
        code: String,
    },
}

/// Single-instance action/event processing engine.
#[derive(Clone)]
pub struct ActionEngine {
    inner: Arc<EngineInner>,
}

impl ActionEngine {
    /// Builds an engine from a validated config and its collaborators.
    pub fn new(config: EngineConfig, collaborators: EngineCollaborators) -> Result<Self> {
        config.validate()?;
        let submit_timeout = Duration::from_millis(config.submit_timeout_ms);
        let retry_interval = Duration::from_millis(config.submit_retry_ms);
        let actions = BoundedQueue::new(
            "actions",
            config.action_queue_capacity,
            submit_timeout,
            retry_interval,
        );
        let events = BoundedQueue::new(
            "events",
            config.event_queue_capacity,
            submit_timeout,
            retry_interval,
        );
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                collaborators,
                actions,
                events,
                listener: Mutex::new(None),
                health: Mutex::new(EngineHealthSnapshot::default()),
                worker_running: AtomicBool::new(false),
                dispatcher_running: AtomicBool::new(false),
            }),
        })
    }

    /// Fire-and-forget submission.
    ///
    /// A queue that stays full for the whole submit window drops the action;
    /// the drop is logged and counted, never surfaced to the caller.
    pub async fn submit(&self, action: ModerationAction) {
        let action_id = action.action_id.clone();
        let kind = action.kind.as_str();
        if self.inner.actions.submit(action).await {
            debug!("action_submitted: id={action_id} kind={kind}");
            self.note_health(Some(&action_id), REASON_ACTION_SUBMITTED, |health| {
                health.submitted_total = health.submitted_total.saturating_add(1);
            });
        } else {
            warn!("action_dropped: id={action_id} kind={kind} queue=actions");
            self.note_health(Some(&action_id), REASON_ACTION_DROPPED, |health| {
                health.dropped_actions_total = health.dropped_actions_total.saturating_add(1);
            });
        }
    }

    /// Registers the single outcome listener; `None` disables dispatch
    /// without stopping the loops.
    pub fn set_outcome_listener(&self, listener: Option<Arc<dyn OutcomeListener>>) {
        *lock_unpoisoned(&self.inner.listener) = listener;
    }

    /// Starts the worker and dispatcher loops; safe to call repeatedly.
    pub fn start(&self) {
        self.start_loop(&self.inner.worker_running, "action_worker", |engine| async move {
            engine.run_worker_loop().await;
        });
        self.start_loop(
            &self.inner.dispatcher_running,
            "event_dispatcher",
            |engine| async move {
                engine.run_dispatch_loop().await;
            },
        );
    }

    /// Returns a clone of the current health counters.
    pub fn inspect_health(&self) -> EngineHealthSnapshot {
        let mut health = lock_unpoisoned(&self.inner.health).clone();
        health.action_queue_depth = self.inner.actions.len();
        health.event_queue_depth = self.inner.events.len();
        health
    }

    fn start_loop<F, Fut>(&self, running: &AtomicBool, name: &'static str, body: F)
    where
        F: FnOnce(ActionEngine) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        if running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("engine_loop_already_running: loop={name}");
            self.note_health(None, REASON_WORKER_ALREADY_RUNNING, |_health| {});
            return;
        }
        info!("engine_loop_started: loop={name}");
        self.note_health(None, REASON_WORKER_STARTED, |_health| {});
        tokio::spawn(body(self.clone()));
    }

    async fn run_worker_loop(self) {
        let tick = Duration::from_millis(self.inner.config.worker_poll_ms);
        loop {
            self.process_pending_actions().await;
            tokio::time::sleep(tick).await;
        }
    }

    async fn run_dispatch_loop(self) {
        let tick = Duration::from_millis(self.inner.config.worker_poll_ms);
        loop {
            self.dispatch_pending_events().await;
            tokio::time::sleep(tick).await;
        }
    }

    /// Drains one atomic batch of actions and processes it in arrival order.
    ///
    /// A failure while processing item `i` is trapped and converted into a
    /// `ProcessingFailed` outcome; items `i+1..n` still run in the same tick.
    pub async fn process_pending_actions(&self) {
        let batch = self.inner.actions.drain_batch();
        if batch.is_empty() {
            return;
        }
        debug!("action_batch_drained: size={}", batch.len());
        for (position, action) in batch.into_iter().enumerate() {
            let action_id = action.action_id.clone();
            let outcome = match self.process_action(&action).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        "action_processing_failed: id={action_id} batch_position={position} error={error:#}"
                    );
                    self.note_health(Some(&action_id), REASON_ACTION_FAILED, |health| {
                        health.action_failures_total = health.action_failures_total.saturating_add(1);
                    });
                    ActionOutcome::ProcessingFailed {
                        action,
                        detail: format!("{error:#}"),
                    }
                }
            };
            self.note_health(Some(&action_id), REASON_ACTION_PROCESSED, |health| {
                health.processed_total = health.processed_total.saturating_add(1);
            });
            self.emit_outcome(outcome).await;
        }
    }

    /// Drains one atomic batch of outcome events and hands each to the
    /// registered listener, trapping per-event listener failures.
    pub async fn dispatch_pending_events(&self) {
        let batch = self.inner.events.drain_batch();
        if batch.is_empty() {
            return;
        }
        let listener = lock_unpoisoned(&self.inner.listener).clone();
        let Some(listener) = listener else {
            debug!("events_discarded_no_listener: count={}", batch.len());
            return;
        };
        for (position, outcome) in batch.iter().enumerate() {
            let action_id = outcome.action().action_id.clone();
            match listener.on_outcome(outcome).await {
                Ok(()) => {
                    self.note_health(Some(&action_id), REASON_EVENT_DISPATCHED, |health| {
                        health.events_dispatched_total =
                            health.events_dispatched_total.saturating_add(1);
                    });
                }
                Err(error) => {
                    warn!(
                        "listener_failed: outcome={} action_id={action_id} batch_position={position} error={error:#}",
                        outcome.as_str()
                    );
                    self.note_health(Some(&action_id), REASON_LISTENER_FAILED, |health| {
                        health.listener_failures_total =
                            health.listener_failures_total.saturating_add(1);
                    });
                }
            }
        }
    }

    /// Emits one outcome with the same bounded-submit-with-drop semantics as
    /// action submission, so a saturated event queue cannot stall the worker.
    async fn emit_outcome(&self, outcome: ActionOutcome) {
        let action_id = outcome.action().action_id.clone();
        let name = outcome.as_str();
        if self.inner.events.submit(outcome).await {
            self.note_health(Some(&action_id), REASON_EVENT_EMITTED, |health| {
                health.events_emitted_total = health.events_emitted_total.saturating_add(1);
            });
        } else {
            warn!("event_dropped: outcome={name} action_id={action_id} queue=events");
            self.note_health(Some(&action_id), REASON_EVENT_DROPPED, |health| {
                health.events_dropped_total = health.events_dropped_total.saturating_add(1);
            });
        }
    }

    async fn process_action(&self, action: &ModerationAction) -> Result<ActionOutcome> {
        if let Some(outcome) = self.check_stream_requirement(action).await? {
            return Ok(outcome);
        }

        // Inventory gate: zero stock short-circuits before any external
        // moderation call.
        if let Some(item) = action.kind.consumed_item() {
            let stock = self
                .inner
                .collaborators
                .inventory
                .snapshot(&action.chatter_id, &action.channel_id)
                .await?;
            if stock.count(item) == 0 {
                return Ok(ActionOutcome::OutOfStock {
                    action: action.clone(),
                    item,
                });
            }
        }

        match &action.kind {
            ActionKind::Basic {
                target_id,
                duration,
            }
            | ActionKind::Grenade {
                target_id,
                duration,
            }
            | ActionKind::AirStrike {
                target_id,
                duration,
            }
            | ActionKind::CopyMessage {
                target_id,
                duration,
            } => self.apply_timeout(action, target_id, duration, None).await,
            ActionKind::Tm36 { duration } => {
                let target_id = action.chatter_id.clone();
                self.apply_timeout(action, &target_id, duration, None).await
            }
            ActionKind::Banana {
                target_id,
                duration,
            } => self.process_banana(action, target_id, duration).await,
            ActionKind::UseItem { item } => {
                let remaining_inventory = self
                    .inner
                    .collaborators
                    .inventory
                    .decrement(*item, &action.chatter_id, &action.channel_id)
                    .await?;
                Ok(ActionOutcome::ItemConsumed {
                    action: action.clone(),
                    item: *item,
                    remaining_inventory,
                })
            }
            ActionKind::TradeItem { target_id, item } => {
                let giver_remaining = self
                    .inner
                    .collaborators
                    .inventory
                    .decrement(*item, &action.chatter_id, &action.channel_id)
                    .await?;
                let receiver_remaining = self
                    .inner
                    .collaborators
                    .inventory
                    .increment(*item, target_id, &action.channel_id)
                    .await?;
                Ok(ActionOutcome::ItemTraded {
                    action: action.clone(),
                    item: *item,
                    giver_remaining,
                    receiver_remaining,
                })
            }
        }
    }

    async fn check_stream_requirement(
        &self,
        action: &ModerationAction,
    ) -> Result<Option<ActionOutcome>> {
        let satisfied = match action.stream_requirement {
            StreamRequirement::Any => true,
            StreamRequirement::LiveOnly => {
                self.inner
                    .collaborators
                    .stream_status
                    .is_live(&action.channel_id)
                    .await?
            }
            StreamRequirement::OfflineOnly => {
                !self
                    .inner
                    .collaborators
                    .stream_status
                    .is_live(&action.channel_id)
                    .await?
            }
        };
        if satisfied {
            return Ok(None);
        }
        Ok(Some(ActionOutcome::StreamStateMismatch {
            action: action.clone(),
            required: action.stream_requirement,
        }))
    }

    async fn process_banana(
        &self,
        action: &ModerationAction,
        target_id: &str,
        duration: &DurationSpec,
    ) -> Result<ActionOutcome> {
        let history = &self.inner.collaborators.history;
        let offense_count = history
            .offense_count(&action.chatter_id, &action.channel_id)
            .await?;
        let (verdict, dice) =
            escalation::evaluate(&self.inner.config.escalation, offense_count);
        // Escalation tracks attempts, so the offense lands before the
        // verdict is acted on.
        history
            .record_offense(&action.chatter_id, &action.channel_id)
            .await?;
        debug!(
            "banana_evaluated: id={} verdict={:?} die={}/{} failure_probability={:.2}",
            action.action_id, verdict, dice.die_value, dice.die_size, dice.failure_probability
        );

        match verdict {
            EscalationVerdict::Failure => Ok(ActionOutcome::DiceRollFailed {
                action: action.clone(),
                dice,
            }),
            EscalationVerdict::Reverse => {
                match self.resolve_timeout(action, &action.chatter_id, duration).await? {
                    TimeoutResolution::Rejected { code } => Ok(ActionOutcome::ModerationRejected {
                        action: action.clone(),
                        code,
                    }),
                    TimeoutResolution::Applied {
                        seconds,
                        duration_label,
                        remaining_inventory,
                    } => Ok(ActionOutcome::TimeoutReversed {
                        action: action.clone(),
                        seconds,
                        duration_label,
                        dice,
                        remaining_inventory,
                    }),
                }
            }
            EscalationVerdict::Success => {
                self.apply_timeout(action, target_id, duration, Some(dice)).await
            }
        }
    }

    async fn apply_timeout(
        &self,
        action: &ModerationAction,
        target_id: &str,
        duration: &DurationSpec,
        dice: Option<DiceRollDetail>,
    ) -> Result<ActionOutcome> {
        match self.resolve_timeout(action, target_id, duration).await? {
            TimeoutResolution::Rejected { code } => Ok(ActionOutcome::ModerationRejected {
                action: action.clone(),
                code,
            }),
            TimeoutResolution::Applied {
                seconds,
                duration_label,
                remaining_inventory,
            } => Ok(ActionOutcome::TimeoutApplied {
                action: action.clone(),
                target_id: target_id.to_string(),
                seconds,
                duration_label,
                remaining_inventory,
                dice,
            }),
        }
    }

    /// Samples the duration, calls the moderation API, and consumes the
    /// action's item only once the effect has landed.
    async fn resolve_timeout(
        &self,
        action: &ModerationAction,
        target_id: &str,
        duration: &DurationSpec,
    ) -> Result<TimeoutResolution> {
        let sampled = sample_duration(duration);
        let receipt = self
            .inner
            .collaborators
            .moderation
            .apply_timeout(
                &action.channel_id,
                target_id,
                &action.moderator,
                sampled.seconds,
            )
            .await?;
        if let ModerationReceipt::Rejected { code } = receipt {
            return Ok(TimeoutResolution::Rejected { code });
        }
        let remaining_inventory = match action.kind.consumed_item() {
            Some(item) => Some(
                self.inner
                    .collaborators
                    .inventory
                    .decrement(item, &action.chatter_id, &action.channel_id)
                    .await?,
            ),
            None => None,
        };
        Ok(TimeoutResolution::Applied {
            seconds: sampled.seconds,
            duration_label: sampled.label,
            remaining_inventory,
        })
    }

    fn note_health(
        &self,
        action_id: Option<&str>,
        reason_code: &str,
        mutate: impl FnOnce(&mut EngineHealthSnapshot),
    ) {
        let mut health = lock_unpoisoned(&self.inner.health);
        mutate(&mut health);
        health.note(action_id, reason_code);
    }
}
