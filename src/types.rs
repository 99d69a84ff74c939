//! Core types for the Vitalsynth engine
//!
//! This module defines the sample records for every supported biometric
//! category and the [`Bundle`] aggregate that carries a full portable
//! dataset. Samples are value types: once a bundle is built, transforms
//! produce new bundles instead of mutating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance marker for freshly synthesized samples
pub const SOURCE_GENERATED: &str = "vitalsynth/generated";
/// Provenance marker for samples derived from an existing bundle
pub const SOURCE_TRANSFORMED: &str = "vitalsynth/transformed";
/// Provenance marker for samples emitted by the continuous stream
pub const SOURCE_STREAMED: &str = "vitalsynth/stream";

/// Sleep stage classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake,
    Light,
    Deep,
    Rem,
}

impl SleepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "awake",
            SleepStage::Light => "light",
            SleepStage::Deep => "deep",
            SleepStage::Rem => "rem",
        }
    }
}

/// Workout activity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    Running,
    Cycling,
    Walking,
    Strength,
    Yoga,
    Swimming,
}

impl WorkoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Cycling => "cycling",
            WorkoutKind::Walking => "walking",
            WorkoutKind::Strength => "strength",
            WorkoutKind::Yoga => "yoga",
            WorkoutKind::Swimming => "swimming",
        }
    }
}

/// Menstrual flow intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowLevel {
    Light,
    Medium,
    Heavy,
}

/// Instant heart-rate reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Beats per minute
    pub bpm: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Instant heart-rate variability reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// SDNN (milliseconds)
    pub sdnn_ms: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Interval activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySample {
    /// Interval start (UTC)
    pub start: DateTime<Utc>,
    /// Interval end (UTC)
    pub end: DateTime<Utc>,
    /// Step count within the interval
    pub steps: f64,
    /// Distance covered (meters), derived from steps
    pub distance_meters: f64,
    /// Active energy burned (kcal), derived from steps
    pub active_calories: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Interval sleep-stage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    /// Stage start (UTC)
    pub start: DateTime<Utc>,
    /// Stage end (UTC)
    pub end: DateTime<Utc>,
    /// Stage classification
    pub stage: SleepStage,
    /// Provenance of the sample
    pub source: String,
}

/// Interval workout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSample {
    /// Workout start (UTC)
    pub start: DateTime<Utc>,
    /// Workout end (UTC)
    pub end: DateTime<Utc>,
    /// Activity type
    pub kind: WorkoutKind,
    /// Total energy burned (kcal)
    pub total_calories: f64,
    /// Distance covered (meters)
    pub distance_meters: f64,
    /// Average heart rate during the workout (bpm)
    pub average_bpm: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Instant respiratory-rate reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespiratorySample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Breaths per minute
    pub breaths_per_minute: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Instant blood-oxygen reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Saturation (percent, 0-100)
    pub percent: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Instant wrist skin-temperature reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinTemperatureSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub celsius: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Instant core body-temperature reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyTemperatureSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub celsius: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Hourly wheelchair push-count reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelchairSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Pushes within the hour
    pub pushes: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Daily exercise-time reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTimeSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Exercise minutes for the day
    pub minutes: f64,
    /// Provenance of the sample
    pub source: String,
}

/// Daily menstrual-flow reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenstrualSample {
    /// Reading time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Flow intensity for the day
    pub flow: FlowLevel,
    /// Whether this day opens a new cycle
    pub cycle_start: bool,
    /// Provenance of the sample
    pub source: String,
}

/// Portable biometric dataset covering one date range
///
/// A bundle owns one series per category plus a scalar resting heart rate.
/// Every timestamp and interval endpoint lies within
/// `[start_date, end_date]` once the bundle is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Unique bundle identifier
    pub bundle_id: String,
    /// When the bundle was assembled (UTC)
    pub created_at: DateTime<Utc>,
    /// Start of the covered range (UTC)
    pub start_date: DateTime<Utc>,
    /// End of the covered range (UTC)
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heart_rate: Vec<HeartRateSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hrv: Vec<HrvSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<ActivitySample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sleep: Vec<SleepSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workouts: Vec<WorkoutSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub respiratory: Vec<RespiratorySample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub oxygen: Vec<OxygenSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skin_temperature: Vec<SkinTemperatureSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_temperature: Vec<BodyTemperatureSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wheelchair: Vec<WheelchairSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercise_time: Vec<ExerciseTimeSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub menstrual: Vec<MenstrualSample>,
    /// Resting heart rate scalar for the range (bpm)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<f64>,
}

impl Bundle {
    /// Creates an empty bundle covering `[start_date, end_date]` with a
    /// fresh identifier.
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Bundle {
            bundle_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            start_date,
            end_date,
            heart_rate: Vec::new(),
            hrv: Vec::new(),
            activity: Vec::new(),
            sleep: Vec::new(),
            workouts: Vec::new(),
            respiratory: Vec::new(),
            oxygen: Vec::new(),
            skin_temperature: Vec::new(),
            body_temperature: Vec::new(),
            wheelchair: Vec::new(),
            exercise_time: Vec::new(),
            menstrual: Vec::new(),
            resting_heart_rate: None,
        }
    }

    /// Total number of samples across every series. The resting-heart-rate
    /// scalar is not a sample and does not count.
    pub fn total_samples(&self) -> usize {
        self.heart_rate.len()
            + self.hrv.len()
            + self.activity.len()
            + self.sleep.len()
            + self.workouts.len()
            + self.respiratory.len()
            + self.oxygen.len()
            + self.skin_temperature.len()
            + self.body_temperature.len()
            + self.wheelchair.len()
            + self.exercise_time.len()
            + self.menstrual.len()
    }

    /// Mean heart rate across the bundle, if any samples exist.
    pub fn mean_heart_rate(&self) -> Option<f64> {
        if self.heart_rate.is_empty() {
            return None;
        }
        let sum: f64 = self.heart_rate.iter().map(|s| s.bpm).sum();
        Some(sum / self.heart_rate.len() as f64)
    }

    /// Mean SDNN across the bundle, if any samples exist.
    pub fn mean_hrv(&self) -> Option<f64> {
        if self.hrv.is_empty() {
            return None;
        }
        let sum: f64 = self.hrv.iter().map(|s| s.sdnn_ms).sum();
        Some(sum / self.hrv.len() as f64)
    }
}
