//! Pattern transforms over metric series
//!
//! A pattern describes how a derived dataset should relate to its source:
//! almost identical, exaggerated, dampened, mirrored, or noisy. Heart rate
//! and HRV get the full treatment with physiology-aware factors (stress
//! raises heart rate but lowers HRV, so "amplified" scales them in opposite
//! directions). The remaining numeric categories share a simplified variant
//! parameterized by a [`MetricProfile`].
//!
//! Every function maps a slice to a new `Vec` of the same length and never
//! mutates its input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rng::SeededRng;

/// Reference resting heart rate used by amplification and reduction.
pub const HEART_RATE_BASELINE: f64 = 70.0;
/// Lowest heart rate the transforms will emit.
pub const HEART_RATE_MIN: f64 = 40.0;
/// Highest heart rate the transforms will emit.
pub const HEART_RATE_MAX: f64 = 200.0;
/// Lowest SDNN the stochastic HRV arms will emit.
pub const HRV_MIN: f64 = 10.0;
/// Highest SDNN the transforms will emit.
pub const HRV_MAX: f64 = 200.0;

/// Relationship between a derived series and its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Small jitter; the derived series tracks the source closely.
    Similar,
    /// Exaggerated stress response.
    Amplified,
    /// Dampened stress response.
    Reduced,
    /// Mirror image around the series mean (or a fixed reference).
    Inverted,
    /// Uncorrelated noise on top of the source values.
    Random,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::Similar => "similar",
            PatternKind::Amplified => "amplified",
            PatternKind::Reduced => "reduced",
            PatternKind::Inverted => "inverted",
            PatternKind::Random => "random",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PatternKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similar" => Ok(PatternKind::Similar),
            "amplified" => Ok(PatternKind::Amplified),
            "reduced" => Ok(PatternKind::Reduced),
            "inverted" => Ok(PatternKind::Inverted),
            "random" => Ok(PatternKind::Random),
            other => Err(EngineError::Unsupported(format!(
                "unknown pattern: {}",
                other
            ))),
        }
    }
}

/// Fixed reference and clamp bounds for the simplified metric variant.
#[derive(Debug, Clone, Copy)]
pub struct MetricProfile {
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
}

/// Respiratory rate, breaths per minute.
pub const RESPIRATORY_PROFILE: MetricProfile = MetricProfile {
    baseline: 15.0,
    min: 8.0,
    max: 30.0,
};

/// Blood oxygen saturation, percent.
pub const OXYGEN_PROFILE: MetricProfile = MetricProfile {
    baseline: 97.0,
    min: 85.0,
    max: 100.0,
};

/// Wrist skin temperature, degrees Celsius.
pub const SKIN_TEMPERATURE_PROFILE: MetricProfile = MetricProfile {
    baseline: 33.8,
    min: 30.0,
    max: 38.0,
};

/// Core body temperature, degrees Celsius.
pub const BODY_TEMPERATURE_PROFILE: MetricProfile = MetricProfile {
    baseline: 36.8,
    min: 35.0,
    max: 40.0,
};

/// Wheelchair pushes per hour.
pub const WHEELCHAIR_PROFILE: MetricProfile = MetricProfile {
    baseline: 30.0,
    min: 0.0,
    max: 200.0,
};

/// Exercise minutes per day.
pub const EXERCISE_PROFILE: MetricProfile = MetricProfile {
    baseline: 30.0,
    min: 0.0,
    max: 180.0,
};

fn series_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Applies a pattern to a heart-rate series (bpm).
///
/// Amplification and reduction scale each sample's distance from the
/// resting reference of 70 bpm; inversion mirrors around the series mean.
/// An empty series is returned unchanged since it has no mean to mirror
/// around.
pub fn perturb_heart_rate(values: &[f64], pattern: PatternKind, rng: &mut SeededRng) -> Vec<f64> {
    match pattern {
        PatternKind::Similar => values
            .iter()
            .map(|v| v + rng.f64_in(-2.0..=2.0))
            .collect(),
        PatternKind::Amplified => values
            .iter()
            .map(|v| {
                let scaled = HEART_RATE_BASELINE
                    + (v - HEART_RATE_BASELINE) * rng.f64_in(1.2..=1.4);
                scaled.min(HEART_RATE_MAX)
            })
            .collect(),
        PatternKind::Reduced => values
            .iter()
            .map(|v| {
                let scaled = HEART_RATE_BASELINE
                    + (v - HEART_RATE_BASELINE) * rng.f64_in(0.6..=0.8);
                scaled.max(HEART_RATE_MIN)
            })
            .collect(),
        PatternKind::Inverted => {
            if values.is_empty() {
                return Vec::new();
            }
            let mean = series_mean(values);
            values
                .iter()
                .map(|v| (2.0 * mean - v).clamp(HEART_RATE_MIN, HEART_RATE_MAX))
                .collect()
        }
        PatternKind::Random => values
            .iter()
            .map(|v| (v + rng.f64_in(-15.0..=15.0)).clamp(HEART_RATE_MIN, HEART_RATE_MAX))
            .collect(),
    }
}

/// Applies a pattern to an HRV (SDNN) series, milliseconds.
///
/// Amplified stress means suppressed variability, so the amplified arm
/// multiplies by a factor below one while the reduced arm raises values.
pub fn perturb_hrv(values: &[f64], pattern: PatternKind, rng: &mut SeededRng) -> Vec<f64> {
    match pattern {
        PatternKind::Similar => values
            .iter()
            .map(|v| (v + rng.f64_in(-2.0..=2.0)).max(0.0))
            .collect(),
        PatternKind::Amplified => values
            .iter()
            .map(|v| (v * rng.f64_in(0.6..=0.8)).max(HRV_MIN))
            .collect(),
        PatternKind::Reduced => values
            .iter()
            .map(|v| (v * rng.f64_in(1.2..=1.4)).min(HRV_MAX))
            .collect(),
        PatternKind::Inverted => {
            if values.is_empty() {
                return Vec::new();
            }
            let mean = series_mean(values);
            values
                .iter()
                .map(|v| (2.0 * mean - v).clamp(HRV_MIN, HRV_MAX))
                .collect()
        }
        PatternKind::Random => values
            .iter()
            .map(|v| (v + rng.f64_in(-10.0..=10.0)).clamp(HRV_MIN, HRV_MAX))
            .collect(),
    }
}

/// Applies the simplified pattern variant used for secondary metrics.
///
/// Unlike the heart-rate and HRV transforms, amplification and reduction
/// use fixed factors (1.2 and 0.8) and inversion mirrors around the
/// profile's fixed baseline rather than the series mean, so a single
/// outlier cannot drag the whole mirrored series with it.
pub fn perturb_metric(
    values: &[f64],
    profile: MetricProfile,
    pattern: PatternKind,
    rng: &mut SeededRng,
) -> Vec<f64> {
    values
        .iter()
        .map(|v| {
            let perturbed = match pattern {
                PatternKind::Similar => v + rng.f64_in(-0.5..=0.5),
                PatternKind::Amplified => profile.baseline + (v - profile.baseline) * 1.2,
                PatternKind::Reduced => profile.baseline + (v - profile.baseline) * 0.8,
                PatternKind::Inverted => 2.0 * profile.baseline - v,
                PatternKind::Random => v + rng.f64_in(-2.0..=2.0),
            };
            perturbed.clamp(profile.min, profile.max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_heart_rates() -> Vec<f64> {
        vec![62.0, 68.0, 75.0, 81.0, 90.0, 72.0]
    }

    fn sample_hrv() -> Vec<f64> {
        vec![35.0, 48.0, 55.0, 61.0, 44.0]
    }

    #[test]
    fn test_similar_heart_rate_stays_close() {
        let source = sample_heart_rates();
        let mut rng = SeededRng::new(42);
        let out = perturb_heart_rate(&source, PatternKind::Similar, &mut rng);
        assert_eq!(out.len(), source.len());
        for (orig, new) in source.iter().zip(&out) {
            assert!((orig - new).abs() <= 2.0);
        }
    }

    #[test]
    fn test_amplified_heart_rate_widens_spread() {
        let source = sample_heart_rates();
        let mut rng = SeededRng::new(42);
        let out = perturb_heart_rate(&source, PatternKind::Amplified, &mut rng);
        for (orig, new) in source.iter().zip(&out) {
            let orig_dist = (orig - HEART_RATE_BASELINE).abs();
            let new_dist = (new - HEART_RATE_BASELINE).abs();
            assert!(new_dist >= orig_dist);
            assert!(*new <= HEART_RATE_MAX);
        }
    }

    #[test]
    fn test_amplified_heart_rate_caps_at_max() {
        let mut rng = SeededRng::new(1);
        let out = perturb_heart_rate(&[195.0, 199.0], PatternKind::Amplified, &mut rng);
        assert!(out.iter().all(|v| *v <= HEART_RATE_MAX));
    }

    #[test]
    fn test_reduced_heart_rate_narrows_spread() {
        let source = sample_heart_rates();
        let mut rng = SeededRng::new(42);
        let out = perturb_heart_rate(&source, PatternKind::Reduced, &mut rng);
        for (orig, new) in source.iter().zip(&out) {
            let orig_dist = (orig - HEART_RATE_BASELINE).abs();
            let new_dist = (new - HEART_RATE_BASELINE).abs();
            assert!(new_dist <= orig_dist);
            assert!(*new >= HEART_RATE_MIN);
        }
    }

    #[test]
    fn test_inverted_heart_rate_mirrors_around_mean() {
        let source = vec![60.0, 70.0, 80.0];
        let mut rng = SeededRng::new(42);
        let out = perturb_heart_rate(&source, PatternKind::Inverted, &mut rng);
        assert_eq!(out, vec![80.0, 70.0, 60.0]);
    }

    #[test]
    fn test_inverted_empty_series_is_noop() {
        let mut rng = SeededRng::new(42);
        let out = perturb_heart_rate(&[], PatternKind::Inverted, &mut rng);
        assert!(out.is_empty());
        let out = perturb_hrv(&[], PatternKind::Inverted, &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn test_random_heart_rate_bounds() {
        let source = vec![42.0, 70.0, 198.0];
        let mut rng = SeededRng::new(5);
        for _ in 0..50 {
            let out = perturb_heart_rate(&source, PatternKind::Random, &mut rng);
            for (orig, new) in source.iter().zip(&out) {
                assert!((orig - new).abs() <= 15.0 + 1e-9);
                assert!((HEART_RATE_MIN..=HEART_RATE_MAX).contains(new));
            }
        }
    }

    #[test]
    fn test_amplified_hrv_suppresses_variability() {
        let source = sample_hrv();
        let mut rng = SeededRng::new(42);
        let out = perturb_hrv(&source, PatternKind::Amplified, &mut rng);
        for (orig, new) in source.iter().zip(&out) {
            assert!(*new <= *orig);
            assert!(*new >= HRV_MIN);
        }
    }

    #[test]
    fn test_reduced_hrv_raises_variability() {
        let source = sample_hrv();
        let mut rng = SeededRng::new(42);
        let out = perturb_hrv(&source, PatternKind::Reduced, &mut rng);
        for (orig, new) in source.iter().zip(&out) {
            assert!(*new >= *orig);
            assert!(*new <= HRV_MAX);
        }
    }

    #[test]
    fn test_similar_hrv_never_negative() {
        let mut rng = SeededRng::new(42);
        for _ in 0..50 {
            let out = perturb_hrv(&[0.5, 1.0], PatternKind::Similar, &mut rng);
            assert!(out.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_metric_amplified_is_deterministic() {
        let source = vec![14.0, 16.0, 18.0];
        let mut rng = SeededRng::new(42);
        let out = perturb_metric(&source, RESPIRATORY_PROFILE, PatternKind::Amplified, &mut rng);
        let expected = [13.8, 16.2, 18.6];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_metric_inverted_uses_fixed_baseline() {
        // Mirror around the profile baseline, not the series mean: a series
        // far above baseline lands symmetrically far below it.
        let source = vec![99.0, 98.0];
        let mut rng = SeededRng::new(42);
        let out = perturb_metric(&source, OXYGEN_PROFILE, PatternKind::Inverted, &mut rng);
        assert_eq!(out, vec![95.0, 96.0]);
    }

    #[test]
    fn test_metric_clamps_to_profile_bounds() {
        let source = vec![29.5, 8.2];
        let mut rng = SeededRng::new(42);
        let out = perturb_metric(&source, RESPIRATORY_PROFILE, PatternKind::Amplified, &mut rng);
        assert!(out.iter().all(|v| (8.0..=30.0).contains(v)));
    }

    #[test]
    fn test_same_seed_reproduces_output() {
        let source = sample_heart_rates();
        let mut a = SeededRng::new(1234);
        let mut b = SeededRng::new(1234);
        let out_a = perturb_heart_rate(&source, PatternKind::Random, &mut a);
        let out_b = perturb_heart_rate(&source, PatternKind::Random, &mut b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_length_preserved_for_all_patterns() {
        let source = sample_heart_rates();
        for pattern in [
            PatternKind::Similar,
            PatternKind::Amplified,
            PatternKind::Reduced,
            PatternKind::Inverted,
            PatternKind::Random,
        ] {
            let mut rng = SeededRng::new(7);
            let out = perturb_heart_rate(&source, pattern, &mut rng);
            assert_eq!(out.len(), source.len());
        }
    }
}
