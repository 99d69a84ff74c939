//! Continuous vitals streaming
//!
//! [`StreamEngine`] emits one heart-rate/HRV pair per tick, shaped by the
//! circadian curves and the active [`StreamScenario`]. The engine owns no
//! timer: the embedding layer calls [`StreamEngine::tick`] on whatever
//! cadence it wants and passes the current instant in, which keeps the
//! whole state machine deterministic and testable without a clock.
//!
//! Two caps protect the receiving store. A rolling one-hour window admits
//! at most [`MAX_SAMPLES_PER_HOUR`] samples; hitting it suspends emission
//! until the window turns over. A session-wide cap of
//! [`MAX_TOTAL_SAMPLES`] is terminal: the engine drops to idle and refuses
//! to start again until it is explicitly reset.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::circadian;
use crate::rng::SeededRng;
use crate::scenario::StreamScenario;
use crate::types::Bundle;

/// Session-wide sample cap. Heart rate and HRV each count as one sample.
pub const MAX_TOTAL_SAMPLES: u64 = 10_000;
/// Rolling one-hour sample cap.
pub const MAX_SAMPLES_PER_HOUR: u64 = 3_600;
/// Heart-rate baseline used when no source bundle is supplied (bpm).
pub const DEFAULT_HEART_RATE_BASELINE: f64 = 70.0;
/// HRV baseline used when no source bundle is supplied (ms).
pub const DEFAULT_HRV_BASELINE: f64 = 45.0;

/// Lifecycle state of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Idle,
    Streaming,
    Paused,
}

/// Externally visible condition of the stream, as shown on presence
/// surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    Idle,
    Streaming,
    Paused,
    RateLimited,
    CapacityReached,
}

/// One emitted heart-rate/HRV pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsPoint {
    /// Emission time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Heart rate (bpm)
    pub heart_rate: f64,
    /// SDNN (milliseconds)
    pub hrv: f64,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "point", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A vitals pair was emitted.
    Emitted(VitalsPoint),
    /// The rolling one-hour window is full; emission resumes when it
    /// turns over.
    HourlyLimitReached,
    /// The session cap was hit; the engine is now idle until reset.
    TotalLimitReached,
    /// The engine is idle or paused.
    Inactive,
}

/// Push-only record for presence surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub is_streaming: bool,
    pub scenario: StreamScenario,
    pub total_samples: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_hrv: Option<f64>,
    pub status: StreamStatus,
    /// When the snapshot was taken (UTC)
    pub timestamp: DateTime<Utc>,
}

/// Stateful continuous-stream generator.
///
/// Each tick derives its seed as `base_seed + total_samples`, a pure
/// function of engine state, so a stream can be replayed sample for
/// sample from the base seed alone.
#[derive(Debug, Clone)]
pub struct StreamEngine {
    state: StreamState,
    scenario: StreamScenario,
    base_seed: u64,
    heart_rate_baseline: f64,
    hrv_baseline: f64,
    total_samples: u64,
    hourly_samples: u64,
    hour_started_at: Option<DateTime<Utc>>,
    last_heart_rate: Option<f64>,
    last_hrv: Option<f64>,
    limit_reached: bool,
}

impl StreamEngine {
    /// Creates an idle engine with the default baselines.
    pub fn new(scenario: StreamScenario, base_seed: u64) -> Self {
        StreamEngine {
            state: StreamState::Idle,
            scenario,
            base_seed,
            heart_rate_baseline: DEFAULT_HEART_RATE_BASELINE,
            hrv_baseline: DEFAULT_HRV_BASELINE,
            total_samples: 0,
            hourly_samples: 0,
            hour_started_at: None,
            last_heart_rate: None,
            last_hrv: None,
            limit_reached: false,
        }
    }

    /// Takes stream baselines from a source bundle's mean heart rate and
    /// HRV, keeping the defaults for any series the bundle lacks.
    pub fn with_baselines_from(mut self, bundle: &Bundle) -> Self {
        if let Some(mean) = bundle.mean_heart_rate() {
            self.heart_rate_baseline = mean;
        }
        if let Some(mean) = bundle.mean_hrv() {
            self.hrv_baseline = mean;
        }
        self
    }

    /// Starts streaming and opens a fresh hourly window.
    ///
    /// Returns `false` without starting when the session cap was reached
    /// and the engine has not been reset.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.limit_reached {
            return false;
        }
        self.state = StreamState::Streaming;
        self.hour_started_at = Some(now);
        self.hourly_samples = 0;
        true
    }

    /// Suspends emission; counters are preserved.
    pub fn pause(&mut self) {
        if self.state == StreamState::Streaming {
            self.state = StreamState::Paused;
        }
    }

    /// Resumes a paused stream.
    pub fn resume(&mut self) {
        if self.state == StreamState::Paused {
            self.state = StreamState::Streaming;
        }
    }

    /// Stops streaming. Counters survive so a later `start` continues
    /// against the same session cap.
    pub fn stop(&mut self) {
        self.state = StreamState::Idle;
    }

    /// Clears counters, the last emitted values, and the terminal
    /// capacity flag. The engine returns to idle.
    pub fn reset(&mut self) {
        self.state = StreamState::Idle;
        self.total_samples = 0;
        self.hourly_samples = 0;
        self.hour_started_at = None;
        self.last_heart_rate = None;
        self.last_hrv = None;
        self.limit_reached = false;
    }

    /// Advances the stream by one tick at `now`.
    ///
    /// Emits a vitals pair unless the engine is inactive or a cap is in
    /// force. Each emitted pair adds two samples to both counters.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.state != StreamState::Streaming {
            return TickOutcome::Inactive;
        }

        match self.hour_started_at {
            Some(opened) if now - opened >= Duration::seconds(3600) => {
                self.hour_started_at = Some(now);
                self.hourly_samples = 0;
            }
            Some(_) => {}
            None => {
                self.hour_started_at = Some(now);
                self.hourly_samples = 0;
            }
        }

        if self.total_samples >= MAX_TOTAL_SAMPLES {
            self.limit_reached = true;
            self.state = StreamState::Idle;
            return TickOutcome::TotalLimitReached;
        }
        if self.hourly_samples >= MAX_SAMPLES_PER_HOUR {
            return TickOutcome::HourlyLimitReached;
        }

        let mut rng = SeededRng::new(self.base_seed.wrapping_add(self.total_samples));
        let hour = circadian::decimal_hour(now);
        let hr_baseline = self.heart_rate_baseline + circadian::heart_rate_adjustment(hour);
        let hrv_baseline = self.hrv_baseline + circadian::hrv_adjustment(hour);
        let heart_rate = self.scenario.apply_to_heart_rate(hr_baseline, &mut rng);
        let hrv = self.scenario.apply_to_hrv(hrv_baseline, &mut rng);

        self.total_samples += 2;
        self.hourly_samples += 2;
        self.last_heart_rate = Some(heart_rate);
        self.last_hrv = Some(hrv);

        TickOutcome::Emitted(VitalsPoint {
            timestamp: now,
            heart_rate,
            hrv,
        })
    }

    /// Current presence record.
    pub fn snapshot(&self, now: DateTime<Utc>) -> StreamSnapshot {
        let status = if self.limit_reached {
            StreamStatus::CapacityReached
        } else {
            match self.state {
                StreamState::Idle => StreamStatus::Idle,
                StreamState::Paused => StreamStatus::Paused,
                StreamState::Streaming => {
                    let window_open = match self.hour_started_at {
                        Some(opened) => now - opened < Duration::seconds(3600),
                        None => false,
                    };
                    if window_open && self.hourly_samples >= MAX_SAMPLES_PER_HOUR {
                        StreamStatus::RateLimited
                    } else {
                        StreamStatus::Streaming
                    }
                }
            }
        };
        StreamSnapshot {
            is_streaming: self.state == StreamState::Streaming,
            scenario: self.scenario,
            total_samples: self.total_samples,
            last_heart_rate: self.last_heart_rate,
            last_hrv: self.last_hrv,
            status,
            timestamp: now,
        }
    }

    /// Switches the active scenario; takes effect on the next tick.
    pub fn set_scenario(&mut self, scenario: StreamScenario) {
        self.scenario = scenario;
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn scenario(&self) -> StreamScenario {
        self.scenario
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }
}

impl Default for StreamEngine {
    fn default() -> Self {
        StreamEngine::new(StreamScenario::Normal, 1)
    }
}
