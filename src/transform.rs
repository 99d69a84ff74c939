//! Whole-bundle transformation
//!
//! Takes a recorded (or previously generated) bundle and produces a new
//! bundle on a different date range: every timestamp is remapped through an
//! [`IntervalMap`], numeric values are reshaped by a [`PatternKind`], and
//! provenance is rewritten to the derived marker. Series cardinality never
//! changes; a transform of a 500-sample bundle is a 500-sample bundle.
//!
//! Heart rate and HRV use the full pattern arms; respiratory, oxygen, skin
//! and body temperature, wheelchair, and exercise use the simplified
//! fixed-baseline variant. Activity step counts, sleep stages, workout
//! payloads, and menstrual flow levels pass through untouched.

use chrono::{DateTime, Duration, Utc};

use crate::error::EngineError;
use crate::pattern::{
    self, PatternKind, BODY_TEMPERATURE_PROFILE, EXERCISE_PROFILE, OXYGEN_PROFILE,
    RESPIRATORY_PROFILE, SKIN_TEMPERATURE_PROFILE, WHEELCHAIR_PROFILE,
};
use crate::remap::IntervalMap;
use crate::rng::SeededRng;
use crate::types::{
    ActivitySample, BodyTemperatureSample, Bundle, ExerciseTimeSample, HeartRateSample,
    HrvSample, MenstrualSample, OxygenSample, RespiratorySample, SkinTemperatureSample,
    SleepSample, WheelchairSample, WorkoutSample, SOURCE_TRANSFORMED,
};

/// Transforms a source bundle onto a new date range.
///
/// # Arguments
///
/// * `source` - the bundle to derive from; it is not modified
/// * `target_start`, `target_end` - the range the derived bundle covers
/// * `pattern` - how derived values relate to the source values
/// * `seed` - seed for the deterministic generator
///
/// # Returns
///
/// A new bundle with the same series cardinalities, or an error when the
/// source bundle declares a zero-length range.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vitalsynth::generate::{generate, GenerationRequest};
/// use vitalsynth::pattern::PatternKind;
/// use vitalsynth::transform::transform;
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let end = start + Duration::days(1);
/// let source = generate(&GenerationRequest::new(start, end), None).unwrap();
/// let derived = transform(
///     &source,
///     start + Duration::days(30),
///     end + Duration::days(30),
///     PatternKind::Similar,
///     7,
/// )
/// .unwrap();
/// assert_eq!(derived.total_samples(), source.total_samples());
/// ```
pub fn transform(
    source: &Bundle,
    target_start: DateTime<Utc>,
    target_end: DateTime<Utc>,
    pattern: PatternKind,
    seed: u64,
) -> Result<Bundle, EngineError> {
    let map = IntervalMap::new(source.start_date, source.end_date, target_start, target_end)?;
    let mut rng = SeededRng::new(seed);
    let mut out = Bundle::new(target_start, target_end);

    let bpm: Vec<f64> = source.heart_rate.iter().map(|s| s.bpm).collect();
    let bpm = pattern::perturb_heart_rate(&bpm, pattern, &mut rng);
    out.heart_rate = source
        .heart_rate
        .iter()
        .zip(bpm)
        .map(|(s, bpm)| HeartRateSample {
            timestamp: map.apply(s.timestamp),
            bpm,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let sdnn: Vec<f64> = source.hrv.iter().map(|s| s.sdnn_ms).collect();
    let sdnn = pattern::perturb_hrv(&sdnn, pattern, &mut rng);
    out.hrv = source
        .hrv
        .iter()
        .zip(sdnn)
        .map(|(s, sdnn_ms)| HrvSample {
            timestamp: map.apply(s.timestamp),
            sdnn_ms,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let breaths: Vec<f64> = source
        .respiratory
        .iter()
        .map(|s| s.breaths_per_minute)
        .collect();
    let breaths = pattern::perturb_metric(&breaths, RESPIRATORY_PROFILE, pattern, &mut rng);
    out.respiratory = source
        .respiratory
        .iter()
        .zip(breaths)
        .map(|(s, breaths_per_minute)| RespiratorySample {
            timestamp: map.apply(s.timestamp),
            breaths_per_minute,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let percent: Vec<f64> = source.oxygen.iter().map(|s| s.percent).collect();
    let percent = pattern::perturb_metric(&percent, OXYGEN_PROFILE, pattern, &mut rng);
    out.oxygen = source
        .oxygen
        .iter()
        .zip(percent)
        .map(|(s, percent)| OxygenSample {
            timestamp: map.apply(s.timestamp),
            percent,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let skin: Vec<f64> = source.skin_temperature.iter().map(|s| s.celsius).collect();
    let skin = pattern::perturb_metric(&skin, SKIN_TEMPERATURE_PROFILE, pattern, &mut rng);
    out.skin_temperature = source
        .skin_temperature
        .iter()
        .zip(skin)
        .map(|(s, celsius)| SkinTemperatureSample {
            timestamp: map.apply(s.timestamp),
            celsius,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let body: Vec<f64> = source.body_temperature.iter().map(|s| s.celsius).collect();
    let body = pattern::perturb_metric(&body, BODY_TEMPERATURE_PROFILE, pattern, &mut rng);
    out.body_temperature = source
        .body_temperature
        .iter()
        .zip(body)
        .map(|(s, celsius)| BodyTemperatureSample {
            timestamp: map.apply(s.timestamp),
            celsius,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let pushes: Vec<f64> = source.wheelchair.iter().map(|s| s.pushes).collect();
    let pushes = pattern::perturb_metric(&pushes, WHEELCHAIR_PROFILE, pattern, &mut rng);
    out.wheelchair = source
        .wheelchair
        .iter()
        .zip(pushes)
        .map(|(s, pushes)| WheelchairSample {
            timestamp: map.apply(s.timestamp),
            pushes,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    let minutes: Vec<f64> = source.exercise_time.iter().map(|s| s.minutes).collect();
    let minutes = pattern::perturb_metric(&minutes, EXERCISE_PROFILE, pattern, &mut rng);
    out.exercise_time = source
        .exercise_time
        .iter()
        .zip(minutes)
        .map(|(s, minutes)| ExerciseTimeSample {
            timestamp: map.apply(s.timestamp),
            minutes,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    out.activity = source
        .activity
        .iter()
        .map(|s| ActivitySample {
            start: map.apply(s.start),
            end: map.apply(s.end),
            steps: s.steps,
            distance_meters: s.distance_meters,
            active_calories: s.active_calories,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    out.sleep = source
        .sleep
        .iter()
        .map(|s| SleepSample {
            start: map.apply(s.start),
            end: map.apply(s.end),
            stage: s.stage,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    out.workouts = source
        .workouts
        .iter()
        .map(|s| WorkoutSample {
            start: map.apply(s.start),
            end: map.apply(s.end),
            kind: s.kind,
            total_calories: s.total_calories,
            distance_meters: s.distance_meters,
            average_bpm: s.average_bpm,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    out.menstrual = source
        .menstrual
        .iter()
        .map(|s| MenstrualSample {
            timestamp: map.apply(s.timestamp),
            flow: s.flow,
            cycle_start: s.cycle_start,
            source: SOURCE_TRANSFORMED.to_string(),
        })
        .collect();

    out.resting_heart_rate = source.resting_heart_rate;

    Ok(out)
}

/// Transforms a bundle so that it ends at `now` with its duration
/// preserved. Useful for replaying an old recording as if it just
/// happened.
pub fn transpose_to_now(
    source: &Bundle,
    pattern: PatternKind,
    seed: u64,
    now: DateTime<Utc>,
) -> Result<Bundle, EngineError> {
    let duration = source.end_date - source.start_date;
    transform(source, now - duration, now, pattern, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, GenerationRequest, ManipulationPolicy};
    use chrono::TimeZone;

    fn source_bundle() -> Bundle {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(3);
        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::AccessibilityMode)
            .with_menstrual(true)
            .with_seed(11);
        generate(&request, None).expect("generate source")
    }

    fn shifted_range(source: &Bundle, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            source.start_date + Duration::days(days),
            source.end_date + Duration::days(days),
        )
    }

    #[test]
    fn test_preserves_every_series_cardinality() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let out = transform(&source, start, end, PatternKind::Amplified, 3).expect("transform");
        assert_eq!(out.heart_rate.len(), source.heart_rate.len());
        assert_eq!(out.hrv.len(), source.hrv.len());
        assert_eq!(out.activity.len(), source.activity.len());
        assert_eq!(out.sleep.len(), source.sleep.len());
        assert_eq!(out.workouts.len(), source.workouts.len());
        assert_eq!(out.respiratory.len(), source.respiratory.len());
        assert_eq!(out.oxygen.len(), source.oxygen.len());
        assert_eq!(out.skin_temperature.len(), source.skin_temperature.len());
        assert_eq!(out.body_temperature.len(), source.body_temperature.len());
        assert_eq!(out.wheelchair.len(), source.wheelchair.len());
        assert_eq!(out.exercise_time.len(), source.exercise_time.len());
        assert_eq!(out.menstrual.len(), source.menstrual.len());
        assert_eq!(out.total_samples(), source.total_samples());
    }

    #[test]
    fn test_timestamps_land_in_target_range() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 60);
        let out = transform(&source, start, end, PatternKind::Similar, 3).expect("transform");
        for s in &out.heart_rate {
            assert!(s.timestamp >= start && s.timestamp <= end);
        }
        for s in &out.sleep {
            assert!(s.start >= start && s.end <= end);
        }
        assert_eq!(out.start_date, start);
        assert_eq!(out.end_date, end);
    }

    #[test]
    fn test_relative_position_is_preserved() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let out = transform(&source, start, end, PatternKind::Similar, 3).expect("transform");
        let source_offset = source.heart_rate[5].timestamp - source.start_date;
        let out_offset = out.heart_rate[5].timestamp - start;
        assert_eq!(source_offset, out_offset);
    }

    #[test]
    fn test_provenance_rewritten() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let out = transform(&source, start, end, PatternKind::Random, 3).expect("transform");
        assert!(out.heart_rate.iter().all(|s| s.source == SOURCE_TRANSFORMED));
        assert!(out.sleep.iter().all(|s| s.source == SOURCE_TRANSFORMED));
        assert!(out.wheelchair.iter().all(|s| s.source == SOURCE_TRANSFORMED));
    }

    #[test]
    fn test_structural_values_pass_through() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let out = transform(&source, start, end, PatternKind::Amplified, 3).expect("transform");
        let source_stages: Vec<_> = source.sleep.iter().map(|s| s.stage).collect();
        let out_stages: Vec<_> = out.sleep.iter().map(|s| s.stage).collect();
        assert_eq!(source_stages, out_stages);
        let source_steps: Vec<_> = source.activity.iter().map(|s| s.steps).collect();
        let out_steps: Vec<_> = out.activity.iter().map(|s| s.steps).collect();
        assert_eq!(source_steps, out_steps);
        let source_kinds: Vec<_> = source.workouts.iter().map(|s| s.kind).collect();
        let out_kinds: Vec<_> = out.workouts.iter().map(|s| s.kind).collect();
        assert_eq!(source_kinds, out_kinds);
        assert_eq!(out.resting_heart_rate, source.resting_heart_rate);
    }

    #[test]
    fn test_similar_pattern_tracks_source_values() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let out = transform(&source, start, end, PatternKind::Similar, 3).expect("transform");
        for (orig, new) in source.heart_rate.iter().zip(&out.heart_rate) {
            assert!((orig.bpm - new.bpm).abs() <= 2.0);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let source = source_bundle();
        let (start, end) = shifted_range(&source, 30);
        let a = transform(&source, start, end, PatternKind::Random, 9).expect("transform");
        let b = transform(&source, start, end, PatternKind::Random, 9).expect("transform");
        assert_eq!(a.heart_rate, b.heart_rate);
        assert_eq!(a.oxygen, b.oxygen);
    }

    #[test]
    fn test_degenerate_source_range_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let degenerate = Bundle::new(start, start);
        let result = transform(
            &degenerate,
            start,
            start + Duration::hours(1),
            PatternKind::Similar,
            1,
        );
        assert!(matches!(result, Err(EngineError::DegenerateInterval)));
    }

    #[test]
    fn test_transpose_to_now_preserves_duration() {
        let source = source_bundle();
        let now = Utc.with_ymd_and_hms(2025, 2, 14, 9, 30, 0).unwrap();
        let out = transpose_to_now(&source, PatternKind::Similar, 5, now).expect("transpose");
        assert_eq!(out.end_date, now);
        assert_eq!(
            out.end_date - out.start_date,
            source.end_date - source.start_date
        );
        if let (Some(first), Some(last)) = (out.heart_rate.first(), out.heart_rate.last()) {
            assert!(first.timestamp >= out.start_date);
            assert!(last.timestamp <= now);
        }
    }
}
