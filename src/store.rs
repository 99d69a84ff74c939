//! Health store seam
//!
//! The engine never talks to a platform health database directly; it goes
//! through [`HealthStore`], a small trait the embedding layer implements.
//! Capability is explicit: a store says whether it accepts writes through
//! [`HealthStore::can_write`], and some categories are read-only on every
//! platform (the device computes them itself). Orchestration skips those
//! silently instead of failing a whole bundle import.
//!
//! [`MemoryStore`] is the emulator-side implementation and the reference
//! for tests.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{
    ActivitySample, BodyTemperatureSample, Bundle, ExerciseTimeSample, HeartRateSample,
    HrvSample, MenstrualSample, OxygenSample, RespiratorySample, SkinTemperatureSample,
    SleepSample, WheelchairSample, WorkoutSample,
};

/// Biometric category a store can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HeartRate,
    Hrv,
    Activity,
    Sleep,
    Workout,
    Respiratory,
    Oxygen,
    SkinTemperature,
    BodyTemperature,
    Wheelchair,
    ExerciseTime,
    Menstrual,
    RestingHeartRate,
}

impl Category {
    /// Categories the platform derives itself and never accepts writes
    /// for.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Category::RestingHeartRate | Category::ExerciseTime | Category::SkinTemperature
        )
    }

    /// All categories, in bundle order.
    pub fn all() -> [Category; 13] {
        [
            Category::HeartRate,
            Category::Hrv,
            Category::Activity,
            Category::Sleep,
            Category::Workout,
            Category::Respiratory,
            Category::Oxygen,
            Category::SkinTemperature,
            Category::BodyTemperature,
            Category::Wheelchair,
            Category::ExerciseTime,
            Category::Menstrual,
            Category::RestingHeartRate,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::HeartRate => "heart_rate",
            Category::Hrv => "hrv",
            Category::Activity => "activity",
            Category::Sleep => "sleep",
            Category::Workout => "workout",
            Category::Respiratory => "respiratory",
            Category::Oxygen => "oxygen",
            Category::SkinTemperature => "skin_temperature",
            Category::BodyTemperature => "body_temperature",
            Category::Wheelchair => "wheelchair",
            Category::ExerciseTime => "exercise_time",
            Category::Menstrual => "menstrual",
            Category::RestingHeartRate => "resting_heart_rate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed union of everything a store can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "sample", rename_all = "snake_case")]
pub enum StoreRecord {
    HeartRate(HeartRateSample),
    Hrv(HrvSample),
    Activity(ActivitySample),
    Sleep(SleepSample),
    Workout(WorkoutSample),
    Respiratory(RespiratorySample),
    Oxygen(OxygenSample),
    SkinTemperature(SkinTemperatureSample),
    BodyTemperature(BodyTemperatureSample),
    Wheelchair(WheelchairSample),
    ExerciseTime(ExerciseTimeSample),
    Menstrual(MenstrualSample),
    RestingHeartRate { bpm: f64 },
}

impl StoreRecord {
    pub fn category(&self) -> Category {
        match self {
            StoreRecord::HeartRate(_) => Category::HeartRate,
            StoreRecord::Hrv(_) => Category::Hrv,
            StoreRecord::Activity(_) => Category::Activity,
            StoreRecord::Sleep(_) => Category::Sleep,
            StoreRecord::Workout(_) => Category::Workout,
            StoreRecord::Respiratory(_) => Category::Respiratory,
            StoreRecord::Oxygen(_) => Category::Oxygen,
            StoreRecord::SkinTemperature(_) => Category::SkinTemperature,
            StoreRecord::BodyTemperature(_) => Category::BodyTemperature,
            StoreRecord::Wheelchair(_) => Category::Wheelchair,
            StoreRecord::ExerciseTime(_) => Category::ExerciseTime,
            StoreRecord::Menstrual(_) => Category::Menstrual,
            StoreRecord::RestingHeartRate { .. } => Category::RestingHeartRate,
        }
    }

    /// Primary instant of the record: the timestamp for point samples,
    /// the interval start for interval samples, nothing for scalars.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            StoreRecord::HeartRate(s) => Some(s.timestamp),
            StoreRecord::Hrv(s) => Some(s.timestamp),
            StoreRecord::Activity(s) => Some(s.start),
            StoreRecord::Sleep(s) => Some(s.start),
            StoreRecord::Workout(s) => Some(s.start),
            StoreRecord::Respiratory(s) => Some(s.timestamp),
            StoreRecord::Oxygen(s) => Some(s.timestamp),
            StoreRecord::SkinTemperature(s) => Some(s.timestamp),
            StoreRecord::BodyTemperature(s) => Some(s.timestamp),
            StoreRecord::Wheelchair(s) => Some(s.timestamp),
            StoreRecord::ExerciseTime(s) => Some(s.timestamp),
            StoreRecord::Menstrual(s) => Some(s.timestamp),
            StoreRecord::RestingHeartRate { .. } => None,
        }
    }
}

/// Abstraction over the platform health database.
pub trait HealthStore {
    /// Whether this store accepts writes at all. Emulator stores do;
    /// stores backed by another user's device do not.
    fn can_write(&self) -> bool;

    /// Reads every record of one category whose primary instant falls in
    /// `[start, end)`. Scalar records are returned regardless of range.
    fn read(
        &self,
        category: Category,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoreRecord>, EngineError>;

    /// Writes a batch of records. Fails with
    /// [`EngineError::WriteRejected`] on the first record whose category
    /// is read-only, and with [`EngineError::StoreUnavailable`] when the
    /// store does not accept writes.
    fn write(&mut self, records: &[StoreRecord]) -> Result<usize, EngineError>;
}

/// In-memory store used on emulators and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<StoreRecord>,
    deny_writes: bool,
}

impl MemoryStore {
    /// Creates an empty, writable store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates a store that refuses every write, mirroring a peer device
    /// we may only observe.
    pub fn read_only() -> Self {
        MemoryStore {
            records: Vec::new(),
            deny_writes: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HealthStore for MemoryStore {
    fn can_write(&self) -> bool {
        !self.deny_writes
    }

    fn read(
        &self,
        category: Category,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StoreRecord>, EngineError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.category() == category)
            .filter(|record| match record.timestamp() {
                Some(t) => t >= start && t < end,
                None => true,
            })
            .cloned()
            .collect())
    }

    fn write(&mut self, records: &[StoreRecord]) -> Result<usize, EngineError> {
        if self.deny_writes {
            return Err(EngineError::StoreUnavailable(
                "store does not accept writes".to_string(),
            ));
        }
        for record in records {
            let category = record.category();
            if category.is_read_only() {
                return Err(EngineError::WriteRejected(category));
            }
        }
        self.records.extend_from_slice(records);
        Ok(records.len())
    }
}

/// Outcome of a bundle import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    /// Samples accepted by the store.
    pub written: usize,
    /// Samples skipped because their category is read-only.
    pub skipped_read_only: usize,
}

/// Flattens a bundle into store records, in bundle order.
pub fn bundle_records(bundle: &Bundle) -> Vec<StoreRecord> {
    let mut records = Vec::with_capacity(bundle.total_samples() + 1);
    records.extend(bundle.heart_rate.iter().cloned().map(StoreRecord::HeartRate));
    records.extend(bundle.hrv.iter().cloned().map(StoreRecord::Hrv));
    records.extend(bundle.activity.iter().cloned().map(StoreRecord::Activity));
    records.extend(bundle.sleep.iter().cloned().map(StoreRecord::Sleep));
    records.extend(bundle.workouts.iter().cloned().map(StoreRecord::Workout));
    records.extend(
        bundle
            .respiratory
            .iter()
            .cloned()
            .map(StoreRecord::Respiratory),
    );
    records.extend(bundle.oxygen.iter().cloned().map(StoreRecord::Oxygen));
    records.extend(
        bundle
            .skin_temperature
            .iter()
            .cloned()
            .map(StoreRecord::SkinTemperature),
    );
    records.extend(
        bundle
            .body_temperature
            .iter()
            .cloned()
            .map(StoreRecord::BodyTemperature),
    );
    records.extend(
        bundle
            .wheelchair
            .iter()
            .cloned()
            .map(StoreRecord::Wheelchair),
    );
    records.extend(
        bundle
            .exercise_time
            .iter()
            .cloned()
            .map(StoreRecord::ExerciseTime),
    );
    records.extend(bundle.menstrual.iter().cloned().map(StoreRecord::Menstrual));
    if let Some(bpm) = bundle.resting_heart_rate {
        records.push(StoreRecord::RestingHeartRate { bpm });
    }
    records
}

/// Imports a bundle into a store, silently skipping read-only categories.
///
/// # Returns
///
/// A report of accepted and skipped sample counts, or an error when the
/// store refuses writes outright.
pub fn write_bundle(
    store: &mut dyn HealthStore,
    bundle: &Bundle,
) -> Result<WriteReport, EngineError> {
    if !store.can_write() {
        return Err(EngineError::StoreUnavailable(
            "store does not accept writes".to_string(),
        ));
    }
    let mut writable = Vec::new();
    let mut skipped_read_only = 0;
    for record in bundle_records(bundle) {
        if record.category().is_read_only() {
            skipped_read_only += 1;
        } else {
            writable.push(record);
        }
    }
    let written = store.write(&writable)?;
    Ok(WriteReport {
        written,
        skipped_read_only,
    })
}

/// Assembles a bundle from everything a store holds in `[start, end)`.
pub fn read_bundle(
    store: &dyn HealthStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Bundle, EngineError> {
    let mut bundle = Bundle::new(start, end);
    for category in Category::all() {
        for record in store.read(category, start, end)? {
            match record {
                StoreRecord::HeartRate(s) => bundle.heart_rate.push(s),
                StoreRecord::Hrv(s) => bundle.hrv.push(s),
                StoreRecord::Activity(s) => bundle.activity.push(s),
                StoreRecord::Sleep(s) => bundle.sleep.push(s),
                StoreRecord::Workout(s) => bundle.workouts.push(s),
                StoreRecord::Respiratory(s) => bundle.respiratory.push(s),
                StoreRecord::Oxygen(s) => bundle.oxygen.push(s),
                StoreRecord::SkinTemperature(s) => bundle.skin_temperature.push(s),
                StoreRecord::BodyTemperature(s) => bundle.body_temperature.push(s),
                StoreRecord::Wheelchair(s) => bundle.wheelchair.push(s),
                StoreRecord::ExerciseTime(s) => bundle.exercise_time.push(s),
                StoreRecord::Menstrual(s) => bundle.menstrual.push(s),
                StoreRecord::RestingHeartRate { bpm } => bundle.resting_heart_rate = Some(bpm),
            }
        }
    }
    Ok(bundle)
}
