//! Dice-roll escalation mechanics for the banana action family.
//!
//! Repeated attempts by the same chatter raise the failure probability up
//! to a configured ceiling; an independent reverse check can flip the
//! effect back onto the instigator. Escalation tracks attempts, not just
//! successes, so the caller records an offense on every verdict.

use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::outcome::DiceRollDetail;

/// Tuning for failure escalation and reverse outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EscalationConfig {
    pub base_failure_probability: f64,
    pub per_offense_increase: f64,
    pub max_failure_probability: f64,
    pub reverse_probability: f64,
    pub die_size: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            base_failure_probability: 0.20,
            per_offense_increase: 0.05,
            max_failure_probability: 0.70,
            reverse_probability: 0.05,
            die_size: 20,
        }
    }
}

impl EscalationConfig {
    /// Validates probability bounds before the engine accepts the config.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_failure_probability", self.base_failure_probability),
            ("max_failure_probability", self.max_failure_probability),
            ("reverse_probability", self.reverse_probability),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                bail!("escalation {name} must lie in [0, 1]");
            }
        }
        if !self.per_offense_increase.is_finite() || self.per_offense_increase < 0.0 {
            bail!("escalation per_offense_increase must be >= 0");
        }
        if self.max_failure_probability < self.base_failure_probability {
            bail!("escalation max_failure_probability must be >= base_failure_probability");
        }
        if self.die_size == 0 {
            bail!("escalation die_size must be >= 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `EscalationVerdict` values.
pub enum EscalationVerdict {
    /// The action proceeds against its target.
    Success,
    /// The action fizzles; no timeout is applied.
    Failure,
    /// The effect is inverted onto the instigator.
    Reverse,
}

/// Computes the clamped failure probability for a given offense count.
pub fn failure_probability(config: &EscalationConfig, offense_count: u64) -> f64 {
    let raised =
        config.base_failure_probability + offense_count as f64 * config.per_offense_increase;
    raised.min(config.max_failure_probability)
}

/// Rolls one attempt using the process rng.
pub fn evaluate(config: &EscalationConfig, offense_count: u64) -> (EscalationVerdict, DiceRollDetail) {
    evaluate_with(config, offense_count, &mut rand::thread_rng())
}

/// Rolls one attempt with the supplied rng.
///
/// The die value is reported for presentation; the verdict itself comes from
/// the reverse check and a separate uniform draw against the failure
/// probability.
pub fn evaluate_with<R: Rng>(
    config: &EscalationConfig,
    offense_count: u64,
    rng: &mut R,
) -> (EscalationVerdict, DiceRollDetail) {
    let probability = failure_probability(config, offense_count);
    let die_size = config.die_size.max(1);
    let die_value = rng.gen_range(1..=die_size);
    let reversed = rng.gen::<f64>() < config.reverse_probability;
    let verdict = if reversed {
        EscalationVerdict::Reverse
    } else if rng.gen::<f64>() < probability {
        EscalationVerdict::Failure
    } else {
        EscalationVerdict::Success
    };
    let detail = DiceRollDetail {
        die_size,
        die_value,
        offense_count,
        failure_probability: probability,
        reversed: verdict == EscalationVerdict::Reverse,
    };
    (verdict, detail)
}
