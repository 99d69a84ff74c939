//! Stress preset catalog
//!
//! Each preset names a physiological regime and pins the closed ranges that
//! bundle generation draws from. The ranges are deliberately conservative
//! for the first three presets and intentionally extreme for `EdgeCases`,
//! which exists to exercise downstream consumers with boundary data.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Statistical regime a synthetic bundle is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressPreset {
    LowerStress,
    Normal,
    HigherStress,
    EdgeCases,
}

/// Closed physiological ranges backing one preset.
#[derive(Debug, Clone)]
pub struct PresetRanges {
    /// Instant heart-rate draws, beats per minute.
    pub heart_rate_bpm: RangeInclusive<f64>,
    /// SDNN draws, milliseconds.
    pub hrv_ms: RangeInclusive<f64>,
    /// Daily step total, spread over hourly activity samples.
    pub steps_per_day: RangeInclusive<f64>,
    /// Nightly sleep window length, hours.
    pub sleep_hours: RangeInclusive<f64>,
}

impl StressPreset {
    /// Returns the ranges for this preset.
    pub fn ranges(&self) -> PresetRanges {
        match self {
            StressPreset::LowerStress => PresetRanges {
                heart_rate_bpm: 55.0..=75.0,
                hrv_ms: 60.0..=100.0,
                steps_per_day: 4000.0..=8000.0,
                sleep_hours: 7.5..=9.0,
            },
            StressPreset::Normal => PresetRanges {
                heart_rate_bpm: 60.0..=85.0,
                hrv_ms: 40.0..=80.0,
                steps_per_day: 6000.0..=12000.0,
                sleep_hours: 6.5..=8.5,
            },
            StressPreset::HigherStress => PresetRanges {
                heart_rate_bpm: 75.0..=110.0,
                hrv_ms: 15.0..=45.0,
                steps_per_day: 3000.0..=15000.0,
                sleep_hours: 4.5..=7.0,
            },
            StressPreset::EdgeCases => PresetRanges {
                heart_rate_bpm: 40.0..=180.0,
                hrv_ms: 5.0..=150.0,
                steps_per_day: 0.0..=30000.0,
                sleep_hours: 2.0..=12.0,
            },
        }
    }

    /// All presets, in catalog order.
    pub fn all() -> [StressPreset; 4] {
        [
            StressPreset::LowerStress,
            StressPreset::Normal,
            StressPreset::HigherStress,
            StressPreset::EdgeCases,
        ]
    }
}

impl fmt::Display for StressPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StressPreset::LowerStress => "lower_stress",
            StressPreset::Normal => "normal",
            StressPreset::HigherStress => "higher_stress",
            StressPreset::EdgeCases => "edge_cases",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StressPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lower_stress" => Ok(StressPreset::LowerStress),
            "normal" => Ok(StressPreset::Normal),
            "higher_stress" => Ok(StressPreset::HigherStress),
            "edge_cases" => Ok(StressPreset::EdgeCases),
            other => Err(EngineError::Unsupported(format!(
                "unknown stress preset: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_ranges() {
        let ranges = StressPreset::Normal.ranges();
        assert_eq!(ranges.heart_rate_bpm, 60.0..=85.0);
        assert_eq!(ranges.hrv_ms, 40.0..=80.0);
        assert_eq!(ranges.steps_per_day, 6000.0..=12000.0);
        assert_eq!(ranges.sleep_hours, 6.5..=8.5);
    }

    #[test]
    fn test_higher_stress_lowers_hrv() {
        let normal = StressPreset::Normal.ranges();
        let stressed = StressPreset::HigherStress.ranges();
        assert!(stressed.hrv_ms.end() < normal.hrv_ms.end());
        assert!(stressed.heart_rate_bpm.end() > normal.heart_rate_bpm.end());
    }

    #[test]
    fn test_edge_cases_span_is_widest() {
        let edge = StressPreset::EdgeCases.ranges();
        for preset in [
            StressPreset::LowerStress,
            StressPreset::Normal,
            StressPreset::HigherStress,
        ] {
            let r = preset.ranges();
            assert!(edge.heart_rate_bpm.start() <= r.heart_rate_bpm.start());
            assert!(edge.heart_rate_bpm.end() >= r.heart_rate_bpm.end());
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for preset in StressPreset::all() {
            let parsed: StressPreset = preset.to_string().parse().expect("parse back");
            assert_eq!(parsed, preset);
        }
    }

    #[test]
    fn test_parse_unknown_is_unsupported() {
        let result = "zen".parse::<StressPreset>();
        assert!(matches!(result, Err(EngineError::Unsupported(_))));
    }

    #[test]
    fn test_serde_snake_case_tags() {
        let json = serde_json::to_string(&StressPreset::HigherStress).expect("serialize");
        assert_eq!(json, "\"higher_stress\"");
    }
}
