//! Timeout duration specifications and sampling.
//!
//! A duration spec travels with the action that references it and is only
//! resolved to concrete seconds inside the worker loop, so two chatters
//! firing the same weapon can land very different timeouts.

use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_WEEK: u64 = 604_800;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Enumerates supported `DurationSpec` values.
pub enum DurationSpec {
    Exact {
        seconds: u64,
    },
    RandomLinear {
        min_seconds: u64,
        max_seconds: u64,
    },
    RandomExponential {
        min_seconds: u64,
        max_seconds: u64,
        scale: f64,
    },
}

impl DurationSpec {
    /// Validates spec bounds before an action referencing it may be queued.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Exact { .. } => Ok(()),
            Self::RandomLinear {
                min_seconds,
                max_seconds,
            } => {
                if min_seconds > max_seconds {
                    bail!("random-linear duration requires min_seconds <= max_seconds");
                }
                Ok(())
            }
            Self::RandomExponential {
                min_seconds,
                max_seconds,
                scale,
            } => {
                if min_seconds > max_seconds {
                    bail!("random-exponential duration requires min_seconds <= max_seconds");
                }
                if !scale.is_finite() || *scale <= 0.0 {
                    bail!("random-exponential duration requires a finite scale > 0");
                }
                Ok(())
            }
        }
    }
}

/// Concrete sampled duration plus its chat-facing label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampledDuration {
    pub seconds: u64,
    pub label: String,
}

/// Samples a concrete duration using the process rng.
pub fn sample_duration(spec: &DurationSpec) -> SampledDuration {
    sample_duration_with(spec, &mut rand::thread_rng())
}

/// Samples a concrete duration from `spec` with the supplied rng.
pub fn sample_duration_with<R: Rng>(spec: &DurationSpec, rng: &mut R) -> SampledDuration {
    let seconds = match spec {
        DurationSpec::Exact { seconds } => *seconds,
        DurationSpec::RandomLinear {
            min_seconds,
            max_seconds,
        } => rng.gen_range(*min_seconds..=*max_seconds),
        DurationSpec::RandomExponential {
            min_seconds,
            max_seconds,
            scale,
        } => {
            // r stays in [0,1) and is not remapped at scale=1, so low scales
            // keep producing occasional near-max outliers.
            let r: f64 = rng.gen();
            let span = max_seconds.saturating_sub(*min_seconds) as f64;
            (r.powf(*scale) * span + *min_seconds as f64).round() as u64
        }
    };
    SampledDuration {
        seconds,
        label: format_duration_label(seconds),
    }
}

/// Renders seconds as a compact label, e.g. `1 minute, 30 seconds`.
///
/// Only non-zero components are emitted; singular is chosen when the
/// component value equals 1.
pub fn format_duration_label(total_seconds: u64) -> String {
    if total_seconds == 0 {
        return "0 seconds".to_string();
    }
    let units = [
        (SECONDS_PER_WEEK, "week", "weeks"),
        (SECONDS_PER_DAY, "day", "days"),
        (SECONDS_PER_HOUR, "hour", "hours"),
        (SECONDS_PER_MINUTE, "minute", "minutes"),
        (1, "second", "seconds"),
    ];
    let mut remaining = total_seconds;
    let mut parts = Vec::new();
    for (unit_seconds, singular, plural) in units {
        let value = remaining / unit_seconds;
        remaining %= unit_seconds;
        if value == 0 {
            continue;
        }
        let unit = if value == 1 { singular } else { plural };
        parts.push(format!("{value} {unit}"));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn exact_spec_returns_seconds_unchanged_with_label() {
        let sampled = sample_duration(&DurationSpec::Exact { seconds: 90 });
        assert_eq!(sampled.seconds, 90);
        assert_eq!(sampled.label, "1 minute, 30 seconds");
    }

    #[test]
    fn duration_label_skips_zero_components_and_pluralizes() {
        assert_eq!(format_duration_label(0), "0 seconds");
        assert_eq!(format_duration_label(1), "1 second");
        assert_eq!(format_duration_label(61), "1 minute, 1 second");
        assert_eq!(format_duration_label(3_600), "1 hour");
        assert_eq!(
            format_duration_label(SECONDS_PER_WEEK + SECONDS_PER_DAY * 2 + 30),
            "1 week, 2 days, 30 seconds"
        );
    }

    #[test]
    fn random_linear_samples_stay_in_bounds_and_center() {
        let spec = DurationSpec::RandomLinear {
            min_seconds: 30,
            max_seconds: 120,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut sum = 0u64;
        for _ in 0..10_000 {
            let sampled = sample_duration_with(&spec, &mut rng);
            assert!(sampled.seconds >= 30);
            assert!(sampled.seconds <= 120);
            sum += sampled.seconds;
        }
        let mean = sum as f64 / 10_000.0;
        assert!((mean - 75.0).abs() < 2.0, "mean drifted to {mean}");
    }

    #[test]
    fn random_exponential_skews_toward_min_for_large_scale() {
        let spec = DurationSpec::RandomExponential {
            min_seconds: 0,
            max_seconds: 1_000,
            scale: 4.0,
        };
        let mut rng = StdRng::seed_from_u64(23);
        let mut samples: Vec<u64> = (0..10_000)
            .map(|_| sample_duration_with(&spec, &mut rng).seconds)
            .collect();
        samples.sort_unstable();
        let median = samples[samples.len() / 2];
        assert!(samples.iter().all(|value| *value <= 1_000));
        assert!(median < 500, "median {median} not skewed toward min");
    }

    #[test]
    fn random_exponential_scale_one_interpolates_linearly() {
        let spec = DurationSpec::RandomExponential {
            min_seconds: 100,
            max_seconds: 200,
            scale: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1_000 {
            let sampled = sample_duration_with(&spec, &mut rng);
            assert!(sampled.seconds >= 100);
            assert!(sampled.seconds <= 200);
        }
    }

    #[test]
    fn spec_validation_rejects_inverted_bounds_and_bad_scale() {
        assert!(DurationSpec::Exact { seconds: 0 }.validate().is_ok());
        assert!(DurationSpec::RandomLinear {
            min_seconds: 10,
            max_seconds: 5,
        }
        .validate()
        .is_err());
        assert!(DurationSpec::RandomExponential {
            min_seconds: 0,
            max_seconds: 10,
            scale: 0.0,
        }
        .validate()
        .is_err());
        assert!(DurationSpec::RandomExponential {
            min_seconds: 0,
            max_seconds: 10,
            scale: f64::NAN,
        }
        .validate()
        .is_err());
    }
}
