//! Synthetic bundle generation
//!
//! Builds a complete [`Bundle`] from a stress preset, a date range, and a
//! seed. Every stochastic decision comes from one [`SeededRng`] threaded
//! through the series in a fixed order (heart rate, HRV, activity, sleep,
//! workouts, respiratory, oxygen, skin temperature, exercise time, body
//! temperature, wheelchair, menstrual, resting heart rate), so one seed
//! reproduces the whole dataset.
//!
//! A [`ManipulationPolicy`] decides how the fresh synthesis is combined
//! with a dataset already present on the target device.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::circadian;
use crate::error::EngineError;
use crate::presets::StressPreset;
use crate::rng::SeededRng;
use crate::types::{
    ActivitySample, BodyTemperatureSample, Bundle, ExerciseTimeSample, FlowLevel,
    HeartRateSample, HrvSample, MenstrualSample, OxygenSample, RespiratorySample, SleepSample,
    SleepStage, SkinTemperatureSample, WheelchairSample, WorkoutKind, WorkoutSample,
    SOURCE_GENERATED,
};

/// Minutes between consecutive heart-rate samples.
pub const HEART_RATE_INTERVAL_MINUTES: i64 = 5;
/// Stride length used to derive activity distance from steps (meters).
pub const STEP_LENGTH_METERS: f64 = 0.7;
/// Energy used to derive activity calories from steps (kcal per step).
pub const CALORIES_PER_STEP: f64 = 0.04;
/// Exercise-time samples below this many minutes are not recorded.
pub const EXERCISE_RECORD_THRESHOLD_MINUTES: f64 = 5.0;

/// How fresh synthesis is combined with data already on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationPolicy {
    /// Leave an existing dataset untouched; synthesize only when the
    /// device has nothing.
    KeepOriginal,
    /// Keep every non-empty series and fill in the absent ones.
    GenerateMissing,
    /// Replace everything with fresh synthesis; wheelchair data is
    /// regenerated only when the existing dataset held some.
    SmoothReplace,
    /// Wheelchair-first dataset: push counts replace step counts.
    AccessibilityMode,
}

impl fmt::Display for ManipulationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManipulationPolicy::KeepOriginal => "keep_original",
            ManipulationPolicy::GenerateMissing => "generate_missing",
            ManipulationPolicy::SmoothReplace => "smooth_replace",
            ManipulationPolicy::AccessibilityMode => "accessibility_mode",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ManipulationPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_original" => Ok(ManipulationPolicy::KeepOriginal),
            "generate_missing" => Ok(ManipulationPolicy::GenerateMissing),
            "smooth_replace" => Ok(ManipulationPolicy::SmoothReplace),
            "accessibility_mode" => Ok(ManipulationPolicy::AccessibilityMode),
            other => Err(EngineError::Unsupported(format!(
                "unknown manipulation policy: {}",
                other
            ))),
        }
    }
}

/// Parameters for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Statistical regime to draw from
    pub preset: StressPreset,
    /// How to combine with existing device data
    pub policy: ManipulationPolicy,
    /// Start of the covered range (UTC)
    pub start: DateTime<Utc>,
    /// End of the covered range (UTC)
    pub end: DateTime<Utc>,
    /// Seed for the deterministic generator
    pub seed: u64,
    /// Whether to synthesize menstrual cycle data
    pub include_menstrual: bool,
}

impl GenerationRequest {
    /// Creates a request with the default regime: normal preset, full
    /// replacement, seed 1, no menstrual data.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        GenerationRequest {
            preset: StressPreset::Normal,
            policy: ManipulationPolicy::SmoothReplace,
            start,
            end,
            seed: 1,
            include_menstrual: false,
        }
    }

    pub fn with_preset(mut self, preset: StressPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_policy(mut self, policy: ManipulationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_menstrual(mut self, include: bool) -> Self {
        self.include_menstrual = include;
        self
    }
}

/// Fresh synthesis before policy composition. The wheelchair coin records
/// the 50% draw that `generate_missing` uses when the device has no
/// wheelchair data.
struct Synthesis {
    bundle: Bundle,
    wheelchair_coin: bool,
}

/// Generates a bundle for the request, composing fresh synthesis with any
/// dataset already on the device according to the request's policy.
///
/// # Arguments
///
/// * `request` - preset, policy, range, and seed for the run
/// * `existing` - dataset currently on the target device, if any
///
/// # Returns
///
/// A new bundle, or an error when the date range is empty or inverted.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vitalsynth::generate::{generate, GenerationRequest};
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
/// let bundle = generate(&GenerationRequest::new(start, end), None).unwrap();
/// assert!(!bundle.heart_rate.is_empty());
/// ```
pub fn generate(
    request: &GenerationRequest,
    existing: Option<&Bundle>,
) -> Result<Bundle, EngineError> {
    if request.end <= request.start {
        return Err(EngineError::EmptyDateRange);
    }

    if request.policy == ManipulationPolicy::KeepOriginal {
        if let Some(bundle) = existing {
            return Ok(bundle.clone());
        }
    }

    let fresh = synthesize(request);
    Ok(match request.policy {
        // An existing bundle was returned above; without one this policy
        // falls back to plain synthesis.
        ManipulationPolicy::KeepOriginal => plain(fresh),
        ManipulationPolicy::GenerateMissing => generate_missing(request, fresh, existing),
        ManipulationPolicy::SmoothReplace => smooth_replace(fresh, existing),
        ManipulationPolicy::AccessibilityMode => accessibility_mode(request, fresh, existing),
    })
}

/// Runs the full fixed-order synthesis for the request.
fn synthesize(request: &GenerationRequest) -> Synthesis {
    let mut rng = SeededRng::new(request.seed);
    let ranges = request.preset.ranges();
    let (start, end) = (request.start, request.end);

    let mut bundle = Bundle::new(start, end);
    bundle.heart_rate = generate_heart_rate(&mut rng, &ranges.heart_rate_bpm, start, end);
    bundle.hrv = generate_hrv(&mut rng, &ranges.hrv_ms, start, end);
    bundle.activity = generate_activity(&mut rng, &ranges.steps_per_day, start, end);
    bundle.sleep = generate_sleep(&mut rng, &ranges.sleep_hours, start, end);
    bundle.workouts = generate_workouts(&mut rng, start, end);
    bundle.respiratory = generate_hourly(&mut rng, start, end, 12.0..=20.0, |t, v| {
        RespiratorySample {
            timestamp: t,
            breaths_per_minute: v,
            source: SOURCE_GENERATED.to_string(),
        }
    });
    bundle.oxygen = generate_hourly(&mut rng, start, end, 94.0..=100.0, |t, v| OxygenSample {
        timestamp: t,
        percent: v,
        source: SOURCE_GENERATED.to_string(),
    });
    bundle.skin_temperature =
        generate_hourly(&mut rng, start, end, 32.5..=35.0, |t, v| SkinTemperatureSample {
            timestamp: t,
            celsius: v,
            source: SOURCE_GENERATED.to_string(),
        });
    bundle.exercise_time = generate_exercise_time(&mut rng, start, end);
    bundle.body_temperature = generate_body_temperature(&mut rng, start, end);
    let wheelchair_coin = rng.chance(0.5);
    bundle.wheelchair = generate_hourly(&mut rng, start, end, 5.0..=80.0, |t, v| {
        WheelchairSample {
            timestamp: t,
            pushes: v,
            source: SOURCE_GENERATED.to_string(),
        }
    });
    if request.include_menstrual {
        bundle.menstrual = generate_menstrual(&mut rng, start, end);
    }
    let lo = *ranges.heart_rate_bpm.start();
    bundle.resting_heart_rate = Some(rng.f64_in(lo - 5.0..=lo + 5.0));

    Synthesis {
        bundle,
        wheelchair_coin,
    }
}

/// Fresh synthesis with no composing policy. Wheelchair data stays out
/// unless a policy asks for it.
fn plain(fresh: Synthesis) -> Bundle {
    let mut out = fresh.bundle;
    out.wheelchair = Vec::new();
    out
}

/// Keeps every non-empty existing series and fills in the absent ones.
/// Wheelchair data absent on the device is filled only when the 50% coin
/// landed heads.
///
/// When carried-over samples and fresh samples meet in one bundle, the
/// output range is the union of the request range and the existing
/// bundle's declared range, so every timestamp stays inside the finalized
/// bounds.
fn generate_missing(
    request: &GenerationRequest,
    fresh: Synthesis,
    existing: Option<&Bundle>,
) -> Bundle {
    let Synthesis {
        bundle: fresh,
        wheelchair_coin,
    } = fresh;

    let existing = match existing {
        Some(bundle) => bundle,
        None => {
            let mut out = fresh;
            if !wheelchair_coin {
                out.wheelchair = Vec::new();
            }
            return out;
        }
    };

    let start = request.start.min(existing.start_date);
    let end = request.end.max(existing.end_date);
    let mut out = Bundle::new(start, end);
    out.heart_rate = keep_or(&existing.heart_rate, fresh.heart_rate);
    out.hrv = keep_or(&existing.hrv, fresh.hrv);
    out.activity = keep_or(&existing.activity, fresh.activity);
    out.sleep = keep_or(&existing.sleep, fresh.sleep);
    out.workouts = keep_or(&existing.workouts, fresh.workouts);
    out.respiratory = keep_or(&existing.respiratory, fresh.respiratory);
    out.oxygen = keep_or(&existing.oxygen, fresh.oxygen);
    out.skin_temperature = keep_or(&existing.skin_temperature, fresh.skin_temperature);
    out.exercise_time = keep_or(&existing.exercise_time, fresh.exercise_time);
    out.body_temperature = keep_or(&existing.body_temperature, fresh.body_temperature);
    out.wheelchair = if !existing.wheelchair.is_empty() {
        existing.wheelchair.clone()
    } else if wheelchair_coin {
        fresh.wheelchair
    } else {
        Vec::new()
    };
    out.menstrual = keep_or(&existing.menstrual, fresh.menstrual);
    out.resting_heart_rate = existing.resting_heart_rate.or(fresh.resting_heart_rate);
    out
}

/// Replaces everything with fresh synthesis. The request range already
/// bounds every sample. Wheelchair data is regenerated only when the
/// device held some; a device without it keeps none.
fn smooth_replace(fresh: Synthesis, existing: Option<&Bundle>) -> Bundle {
    let mut out = fresh.bundle;
    if existing.map_or(true, |bundle| bundle.wheelchair.is_empty()) {
        out.wheelchair = Vec::new();
    }
    out
}

/// Substitutes wheelchair pushes for steps: the fresh wheelchair series
/// comes in, step counts zero out, and every other series passes through
/// from the existing bundle (or stays fresh when there is none).
fn accessibility_mode(
    request: &GenerationRequest,
    fresh: Synthesis,
    existing: Option<&Bundle>,
) -> Bundle {
    let fresh = fresh.bundle;

    let existing = match existing {
        Some(bundle) => bundle,
        None => {
            let mut out = fresh;
            zero_steps(&mut out.activity);
            return out;
        }
    };

    let start = request.start.min(existing.start_date);
    let end = request.end.max(existing.end_date);
    let mut out = Bundle::new(start, end);
    out.heart_rate = existing.heart_rate.clone();
    out.hrv = existing.hrv.clone();
    out.activity = existing.activity.clone();
    zero_steps(&mut out.activity);
    out.sleep = existing.sleep.clone();
    out.workouts = existing.workouts.clone();
    out.respiratory = existing.respiratory.clone();
    out.oxygen = existing.oxygen.clone();
    out.skin_temperature = existing.skin_temperature.clone();
    out.exercise_time = existing.exercise_time.clone();
    out.body_temperature = existing.body_temperature.clone();
    out.wheelchair = fresh.wheelchair;
    out.menstrual = existing.menstrual.clone();
    out.resting_heart_rate = existing.resting_heart_rate;
    out
}

fn keep_or<T: Clone>(existing: &[T], fresh: Vec<T>) -> Vec<T> {
    if existing.is_empty() {
        fresh
    } else {
        existing.to_vec()
    }
}

fn zero_steps(activity: &mut [ActivitySample]) {
    for sample in activity {
        sample.steps = 0.0;
        sample.distance_meters = 0.0;
        sample.active_calories = 0.0;
    }
}

fn generate_heart_rate(
    rng: &mut SeededRng,
    bpm: &RangeInclusive<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<HeartRateSample> {
    let mut samples = Vec::new();
    let mut t = start;
    while t < end {
        samples.push(HeartRateSample {
            timestamp: t,
            bpm: rng.f64_in(bpm.clone()),
            source: SOURCE_GENERATED.to_string(),
        });
        t += Duration::minutes(HEART_RATE_INTERVAL_MINUTES);
    }
    samples
}

fn generate_hrv(
    rng: &mut SeededRng,
    sdnn: &RangeInclusive<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<HrvSample> {
    let mut samples = Vec::new();
    let mut t = start;
    while t < end {
        samples.push(HrvSample {
            timestamp: t,
            sdnn_ms: rng.f64_in(sdnn.clone()),
            source: SOURCE_GENERATED.to_string(),
        });
        t += Duration::hours(1);
    }
    samples
}

/// Hourly activity intervals. Steps follow a per-day total spread over
/// waking hours (06:00-22:00) with multiplicative jitter; overnight hours
/// record zero steps. Distance and calories derive from the step count so
/// the three fields never contradict each other.
fn generate_activity(
    rng: &mut SeededRng,
    steps_per_day: &RangeInclusive<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<ActivitySample> {
    const WAKING_HOURS: f64 = 16.0;
    let mut samples = Vec::new();
    let mut day_start = start;
    while day_start < end {
        let day_end = (day_start + Duration::days(1)).min(end);
        let daily_total = rng.f64_in(steps_per_day.clone());
        let mut t = day_start;
        while t < day_end {
            let hour = circadian::decimal_hour(t);
            let steps = if (6.0..22.0).contains(&hour) {
                (daily_total / WAKING_HOURS) * rng.f64_in(0.5..=1.5)
            } else {
                0.0
            };
            samples.push(ActivitySample {
                start: t,
                end: (t + Duration::hours(1)).min(day_end),
                steps,
                distance_meters: steps * STEP_LENGTH_METERS,
                active_calories: steps * CALORIES_PER_STEP,
                source: SOURCE_GENERATED.to_string(),
            });
            t += Duration::hours(1);
        }
        day_start = day_end;
    }
    samples
}

/// Nightly sleep windows opening at 22:00, filled with 20-90 minute
/// stages. The stage distribution is weighted toward light sleep
/// (4 light : 3 deep : 2 rem : 1 awake). Windows and stages truncate at
/// the bundle end.
fn generate_sleep(
    rng: &mut SeededRng,
    sleep_hours: &RangeInclusive<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<SleepSample> {
    let mut samples = Vec::new();
    let mut date = start.date_naive();
    loop {
        let night_start = match date.and_hms_opt(22, 0, 0) {
            Some(naive) => Utc.from_utc_datetime(&naive),
            None => break,
        };
        if night_start >= end {
            break;
        }
        if night_start >= start {
            let length_hours = rng.f64_in(sleep_hours.clone());
            let window_end = (night_start
                + Duration::milliseconds((length_hours * 3_600_000.0) as i64))
            .min(end);
            let mut cursor = night_start;
            while cursor < window_end {
                let stage_minutes = rng.u64_in(20..=90);
                let stage = match rng.next_u64() % 10 {
                    0..=3 => SleepStage::Light,
                    4..=6 => SleepStage::Deep,
                    7..=8 => SleepStage::Rem,
                    _ => SleepStage::Awake,
                };
                let stage_end = (cursor + Duration::minutes(stage_minutes as i64)).min(window_end);
                samples.push(SleepSample {
                    start: cursor,
                    end: stage_end,
                    stage,
                    source: SOURCE_GENERATED.to_string(),
                });
                cursor = stage_end;
            }
        }
        date += Duration::days(1);
    }
    samples
}

const WORKOUT_KINDS: [WorkoutKind; 6] = [
    WorkoutKind::Running,
    WorkoutKind::Cycling,
    WorkoutKind::Walking,
    WorkoutKind::Strength,
    WorkoutKind::Yoga,
    WorkoutKind::Swimming,
];

/// Workouts land every 1-3 days at a random daytime hour. Calories,
/// distance, and average heart rate are drawn per workout; distance uses a
/// kind-specific pace and is zero for stationary kinds.
fn generate_workouts(
    rng: &mut SeededRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<WorkoutSample> {
    let mut samples = Vec::new();
    let mut day = start + Duration::days(rng.u64_in(0..=2) as i64);
    while day < end {
        let hour = rng.u64_in(8..=19) as u32;
        let minutes = rng.u64_in(20..=90) as i64;
        let kind = *rng.choose(&WORKOUT_KINDS).unwrap_or(&WorkoutKind::Walking);
        if let Some(naive) = day.date_naive().and_hms_opt(hour, 0, 0) {
            let w_start = Utc.from_utc_datetime(&naive);
            let w_end = (w_start + Duration::minutes(minutes)).min(end);
            if w_start >= start && w_start < end {
                let actual_minutes = (w_end - w_start).num_minutes() as f64;
                let pace_m_per_min = match kind {
                    WorkoutKind::Running => rng.f64_in(150.0..=220.0),
                    WorkoutKind::Cycling => rng.f64_in(250.0..=500.0),
                    WorkoutKind::Walking => rng.f64_in(60.0..=100.0),
                    WorkoutKind::Swimming => rng.f64_in(30.0..=60.0),
                    WorkoutKind::Strength | WorkoutKind::Yoga => 0.0,
                };
                samples.push(WorkoutSample {
                    start: w_start,
                    end: w_end,
                    kind,
                    total_calories: actual_minutes * rng.f64_in(6.0..=12.0),
                    distance_meters: actual_minutes * pace_m_per_min,
                    average_bpm: rng.f64_in(100.0..=165.0),
                    source: SOURCE_GENERATED.to_string(),
                });
            }
        }
        day += Duration::days(rng.u64_in(1..=3) as i64);
    }
    samples
}

/// One sample per hour with a value drawn uniformly from `values`.
fn generate_hourly<S>(
    rng: &mut SeededRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    values: RangeInclusive<f64>,
    build: impl Fn(DateTime<Utc>, f64) -> S,
) -> Vec<S> {
    let mut samples = Vec::new();
    let mut t = start;
    while t < end {
        samples.push(build(t, rng.f64_in(values.clone())));
        t += Duration::hours(1);
    }
    samples
}

/// Daily exercise minutes at 21:00; days at or below the recording
/// threshold produce no sample, matching how devices only log meaningful
/// exercise.
fn generate_exercise_time(
    rng: &mut SeededRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<ExerciseTimeSample> {
    let mut samples = Vec::new();
    let mut date = start.date_naive();
    loop {
        let at = match date.and_hms_opt(21, 0, 0) {
            Some(naive) => Utc.from_utc_datetime(&naive),
            None => break,
        };
        if at >= end {
            break;
        }
        let minutes = rng.f64_in(0.0..=90.0);
        if at >= start && minutes > EXERCISE_RECORD_THRESHOLD_MINUTES {
            samples.push(ExerciseTimeSample {
                timestamp: at,
                minutes,
                source: SOURCE_GENERATED.to_string(),
            });
        }
        date += Duration::days(1);
    }
    samples
}

/// Body temperature at 08:00 and 20:00 each day.
fn generate_body_temperature(
    rng: &mut SeededRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<BodyTemperatureSample> {
    let mut samples = Vec::new();
    let mut date = start.date_naive();
    'days: loop {
        for hour in [8, 20] {
            let at = match date.and_hms_opt(hour, 0, 0) {
                Some(naive) => Utc.from_utc_datetime(&naive),
                None => break 'days,
            };
            if at >= end {
                break 'days;
            }
            let celsius = rng.f64_in(36.2..=37.3);
            if at >= start {
                samples.push(BodyTemperatureSample {
                    timestamp: at,
                    celsius,
                    source: SOURCE_GENERATED.to_string(),
                });
            }
        }
        date += Duration::days(1);
    }
    samples
}

/// Menstrual cycles every 28-35 days with 3-7 day flow windows. The first
/// and last day of a window are light; the second and third are medium or
/// heavy; any remaining middle days are medium.
fn generate_menstrual(
    rng: &mut SeededRng,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<MenstrualSample> {
    let mut samples = Vec::new();
    let mut cycle_anchor = start;
    while cycle_anchor < end {
        let flow_days = rng.u64_in(3..=7);
        for d in 0..flow_days {
            let day_ts = cycle_anchor + Duration::days(d as i64);
            let last = d == flow_days - 1;
            let flow = if d == 0 || last {
                FlowLevel::Light
            } else if d <= 2 {
                if rng.chance(0.5) {
                    FlowLevel::Heavy
                } else {
                    FlowLevel::Medium
                }
            } else {
                FlowLevel::Medium
            };
            if day_ts >= end {
                break;
            }
            samples.push(MenstrualSample {
                timestamp: day_ts,
                flow,
                cycle_start: d == 0,
                source: SOURCE_GENERATED.to_string(),
            });
        }
        cycle_anchor += Duration::days(rng.u64_in(28..=35) as i64);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_hours(hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (start, start + Duration::hours(hours))
    }

    fn range_days(days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        range_hours(days * 24)
    }

    #[test]
    fn test_one_hour_window_cadence() {
        let (start, end) = range_hours(1);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert_eq!(bundle.heart_rate.len(), 12);
        assert_eq!(bundle.hrv.len(), 1);
        assert_eq!(bundle.respiratory.len(), 1);
        assert_eq!(bundle.oxygen.len(), 1);
        assert_eq!(bundle.activity.len(), 1);
    }

    #[test]
    fn test_empty_range_rejected() {
        let (start, _) = range_hours(1);
        let request = GenerationRequest::new(start, start);
        assert!(matches!(
            generate(&request, None),
            Err(EngineError::EmptyDateRange)
        ));
        let inverted = GenerationRequest::new(start, start - Duration::hours(1));
        assert!(matches!(
            generate(&inverted, None),
            Err(EngineError::EmptyDateRange)
        ));
    }

    #[test]
    fn test_same_seed_reproduces_series() {
        let (start, end) = range_days(3);
        let request = GenerationRequest::new(start, end).with_seed(99);
        let a = generate(&request, None).expect("generate");
        let b = generate(&request, None).expect("generate");
        assert_eq!(a.heart_rate, b.heart_rate);
        assert_eq!(a.sleep, b.sleep);
        assert_eq!(a.workouts, b.workouts);
        assert_eq!(a.resting_heart_rate, b.resting_heart_rate);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (start, end) = range_days(1);
        let a = generate(&GenerationRequest::new(start, end).with_seed(1), None).expect("a");
        let b = generate(&GenerationRequest::new(start, end).with_seed(2), None).expect("b");
        assert_ne!(
            a.heart_rate.iter().map(|s| s.bpm).collect::<Vec<_>>(),
            b.heart_rate.iter().map(|s| s.bpm).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_values_stay_in_preset_ranges() {
        let (start, end) = range_days(2);
        for preset in StressPreset::all() {
            let request = GenerationRequest::new(start, end).with_preset(preset);
            let bundle = generate(&request, None).expect("generate");
            let ranges = preset.ranges();
            for sample in &bundle.heart_rate {
                assert!(ranges.heart_rate_bpm.contains(&sample.bpm));
            }
            for sample in &bundle.hrv {
                assert!(ranges.hrv_ms.contains(&sample.sdnn_ms));
            }
        }
    }

    #[test]
    fn test_sleep_stages_inside_bundle_and_bounded() {
        let (start, end) = range_days(4);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert!(!bundle.sleep.is_empty());
        for sample in &bundle.sleep {
            assert!(sample.start >= start);
            assert!(sample.end <= end);
            assert!(sample.end > sample.start);
            let minutes = (sample.end - sample.start).num_minutes();
            assert!(minutes <= 90);
        }
    }

    #[test]
    fn test_activity_fields_are_consistent() {
        let (start, end) = range_days(2);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        for sample in &bundle.activity {
            assert_eq!(sample.distance_meters, sample.steps * STEP_LENGTH_METERS);
            assert_eq!(sample.active_calories, sample.steps * CALORIES_PER_STEP);
        }
    }

    #[test]
    fn test_overnight_hours_record_no_steps() {
        let (start, end) = range_days(1);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        for sample in &bundle.activity {
            let hour = circadian::decimal_hour(sample.start);
            if !(6.0..22.0).contains(&hour) {
                assert_eq!(sample.steps, 0.0);
            }
        }
    }

    #[test]
    fn test_workouts_within_range() {
        let (start, end) = range_days(14);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert!(!bundle.workouts.is_empty());
        for workout in &bundle.workouts {
            assert!(workout.start >= start && workout.end <= end);
            assert!(workout.end > workout.start);
        }
    }

    #[test]
    fn test_exercise_time_above_threshold_only() {
        let (start, end) = range_days(30);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        for sample in &bundle.exercise_time {
            assert!(sample.minutes > EXERCISE_RECORD_THRESHOLD_MINUTES);
        }
    }

    #[test]
    fn test_body_temperature_twice_daily() {
        let (start, end) = range_days(3);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert_eq!(bundle.body_temperature.len(), 6);
    }

    #[test]
    fn test_menstrual_flow_structure() {
        let (start, end) = range_days(80);
        let request = GenerationRequest::new(start, end).with_menstrual(true).with_seed(7);
        let bundle = generate(&request, None).expect("generate");
        assert!(!bundle.menstrual.is_empty());

        // Group consecutive samples into flow windows via the cycle flag.
        let mut windows: Vec<Vec<&MenstrualSample>> = Vec::new();
        for sample in &bundle.menstrual {
            if sample.cycle_start {
                windows.push(Vec::new());
            }
            windows
                .last_mut()
                .expect("cycle_start opens a window")
                .push(sample);
        }
        for window in &windows {
            assert!(window.len() <= 7);
            assert_eq!(window[0].flow, FlowLevel::Light);
            assert!(window[0].cycle_start);
        }
        // Complete windows (not truncated by the bundle end) close light
        // and carry 3 to 7 days.
        for window in windows.iter().filter(|w| {
            w.last()
                .map(|s| s.timestamp + Duration::days(1) < end)
                .unwrap_or(false)
        }) {
            assert!(window.len() >= 3);
            assert_eq!(window.last().expect("non-empty").flow, FlowLevel::Light);
        }
    }

    #[test]
    fn test_no_menstrual_unless_requested() {
        let (start, end) = range_days(40);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert!(bundle.menstrual.is_empty());
    }

    #[test]
    fn test_plain_generation_skips_wheelchair() {
        let (start, end) = range_days(1);
        let bundle = generate(&GenerationRequest::new(start, end), None).expect("generate");
        assert!(bundle.wheelchair.is_empty());
    }

    #[test]
    fn test_keep_original_returns_existing() {
        let (start, end) = range_days(1);
        let existing = generate(&GenerationRequest::new(start, end).with_seed(5), None)
            .expect("seed bundle");
        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::KeepOriginal)
            .with_seed(1234);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert_eq!(out, existing);
    }

    #[test]
    fn test_keep_original_without_existing_synthesizes() {
        let (start, end) = range_days(1);
        let request =
            GenerationRequest::new(start, end).with_policy(ManipulationPolicy::KeepOriginal);
        let out = generate(&request, None).expect("generate");
        assert!(!out.heart_rate.is_empty());
        // The fallback is plain synthesis: wheelchair data stays out.
        assert!(out.wheelchair.is_empty());
    }

    #[test]
    fn test_generate_missing_fills_absent_series() {
        let (start, end) = range_days(1);
        let mut existing = Bundle::new(start, end);
        existing.heart_rate.push(HeartRateSample {
            timestamp: start,
            bpm: 64.0,
            source: "device".to_string(),
        });
        let request =
            GenerationRequest::new(start, end).with_policy(ManipulationPolicy::GenerateMissing);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert_eq!(out.heart_rate, existing.heart_rate);
        assert!(!out.hrv.is_empty());
        assert!(!out.sleep.is_empty());
    }

    #[test]
    fn test_generate_missing_wheelchair_coin_varies_by_seed() {
        let (start, end) = range_days(1);
        let existing = Bundle::new(start, end);
        let mut with_wheelchair = 0;
        let mut without = 0;
        for seed in 1..=40 {
            let request = GenerationRequest::new(start, end)
                .with_policy(ManipulationPolicy::GenerateMissing)
                .with_seed(seed);
            let out = generate(&request, Some(&existing)).expect("generate");
            if out.wheelchair.is_empty() {
                without += 1;
            } else {
                with_wheelchair += 1;
            }
        }
        assert!(with_wheelchair > 0);
        assert!(without > 0);
    }

    #[test]
    fn test_smooth_replace_ignores_existing_values() {
        let (start, end) = range_days(1);
        let existing = generate(&GenerationRequest::new(start, end).with_seed(5), None)
            .expect("seed bundle");
        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::SmoothReplace)
            .with_seed(6);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert_ne!(
            out.heart_rate.iter().map(|s| s.bpm).collect::<Vec<_>>(),
            existing.heart_rate.iter().map(|s| s.bpm).collect::<Vec<_>>()
        );
        assert_eq!(out.heart_rate.len(), existing.heart_rate.len());
        // The device had no wheelchair data, so the replacement carries
        // none either.
        assert!(existing.wheelchair.is_empty());
        assert!(out.wheelchair.is_empty());
    }

    #[test]
    fn test_smooth_replace_regenerates_wheelchair_when_present() {
        let (start, end) = range_days(1);
        let existing = generate(
            &GenerationRequest::new(start, end)
                .with_policy(ManipulationPolicy::AccessibilityMode)
                .with_seed(5),
            None,
        )
        .expect("seed bundle");
        assert!(!existing.wheelchair.is_empty());

        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::SmoothReplace)
            .with_seed(6);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert!(!out.wheelchair.is_empty());
        assert_ne!(
            out.wheelchair.iter().map(|s| s.pushes).collect::<Vec<_>>(),
            existing.wheelchair.iter().map(|s| s.pushes).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_accessibility_mode_swaps_steps_for_pushes() {
        let (start, end) = range_days(1);
        let existing = generate(&GenerationRequest::new(start, end).with_seed(5), None)
            .expect("seed bundle");
        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::AccessibilityMode)
            .with_seed(6);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert!(!out.wheelchair.is_empty());
        assert!(out.activity.iter().all(|s| s.steps == 0.0));
        assert_eq!(out.heart_rate, existing.heart_rate);
    }

    #[test]
    fn test_accessibility_mode_without_existing() {
        let (start, end) = range_days(1);
        let request = GenerationRequest::new(start, end)
            .with_policy(ManipulationPolicy::AccessibilityMode);
        let out = generate(&request, None).expect("generate");
        assert!(!out.wheelchair.is_empty());
        assert!(!out.heart_rate.is_empty());
        assert!(out.activity.iter().all(|s| s.steps == 0.0));
    }

    #[test]
    fn test_union_range_with_existing() {
        let (start, end) = range_days(1);
        let wider_start = start - Duration::days(1);
        let mut existing = Bundle::new(wider_start, end);
        existing.heart_rate.push(HeartRateSample {
            timestamp: wider_start,
            bpm: 61.0,
            source: "device".to_string(),
        });
        let request =
            GenerationRequest::new(start, end).with_policy(ManipulationPolicy::GenerateMissing);
        let out = generate(&request, Some(&existing)).expect("generate");
        assert_eq!(out.start_date, wider_start);
        assert_eq!(out.end_date, end);
    }
}
