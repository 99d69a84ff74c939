//! Circadian adjustment curves
//!
//! The continuous stream shapes its baselines by time of day so an
//! emulator fed for hours shows a plausible daily rhythm: suppressed heart
//! rate and elevated HRV overnight, the opposite during working hours.
//! Heart rate keeps its daytime elevation until 18:00 while HRV recovers
//! from 17:00, mirroring the lag between subjective wind-down and
//! autonomic recovery.

use std::f64::consts::TAU;

use chrono::{DateTime, Timelike, Utc};

/// Hour of day as a fraction, e.g. 13:30 becomes 13.5.
pub fn decimal_hour(t: DateTime<Utc>) -> f64 {
    t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0
}

/// Heart-rate offset (bpm) for a decimal hour of day.
///
/// Night (22:00-06:00) sits around -15 bpm, daytime (09:00-18:00) around
/// +10 bpm, with a small cosine ripple in the transition hours.
pub fn heart_rate_adjustment(hour: f64) -> f64 {
    let ripple = TAU * hour / 24.0;
    if hour >= 22.0 || hour < 6.0 {
        -15.0 + 2.0 * ripple.cos()
    } else if (9.0..18.0).contains(&hour) {
        10.0 + 3.0 * ripple.sin()
    } else {
        2.0 * ripple.cos()
    }
}

/// HRV offset (ms) for a decimal hour of day.
///
/// Elevated during sleep hours, suppressed through the working day
/// (09:00-17:00), near flat otherwise.
pub fn hrv_adjustment(hour: f64) -> f64 {
    if hour >= 22.0 || hour < 6.0 {
        15.0
    } else if (9.0..17.0).contains(&hour) {
        -10.0
    } else {
        2.0 * (TAU * hour / 24.0).sin()
    }
}
