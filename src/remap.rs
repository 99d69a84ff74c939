//! Interval remapping
//!
//! Transplanting a recorded dataset onto a new date range means moving every
//! timestamp so that its relative position inside the range is preserved.
//! [`IntervalMap`] captures one such linear mapping and applies it to
//! arbitrary instants, including instants outside the source interval
//! (needed when a bundle is transposed so that it ends "now").

use chrono::{DateTime, Duration, Utc};

use crate::error::EngineError;

/// Linear mapping from a source time interval onto a target interval.
///
/// A timestamp at fraction `f` of the source interval maps to fraction `f`
/// of the target interval; timestamps before or after the source interval
/// extrapolate along the same line. Results are rounded to whole
/// milliseconds, so mapping an interval onto itself returns
/// millisecond-precision inputs unchanged.
#[derive(Debug, Clone)]
pub struct IntervalMap {
    original_start: DateTime<Utc>,
    original_span_ms: i64,
    target_start: DateTime<Utc>,
    target_span_ms: i64,
}

impl IntervalMap {
    /// Builds a mapping between two intervals.
    ///
    /// # Arguments
    ///
    /// * `original_start`, `original_end` - the interval the data currently
    ///   occupies
    /// * `target_start`, `target_end` - the interval it should occupy
    ///
    /// # Returns
    ///
    /// An error when the source interval has zero length; the relative
    /// position of a sample inside a zero-length interval is undefined, so
    /// the caller has to supply a real range.
    pub fn new(
        original_start: DateTime<Utc>,
        original_end: DateTime<Utc>,
        target_start: DateTime<Utc>,
        target_end: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let original_span_ms = (original_end - original_start).num_milliseconds();
        if original_span_ms == 0 {
            return Err(EngineError::DegenerateInterval);
        }
        let target_span_ms = (target_end - target_start).num_milliseconds();
        Ok(IntervalMap {
            original_start,
            original_span_ms,
            target_start,
            target_span_ms,
        })
    }

    /// Maps one instant from the source interval onto the target interval.
    pub fn apply(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let offset_ms = (t - self.original_start).num_milliseconds();
        let fraction = offset_ms as f64 / self.original_span_ms as f64;
        let mapped_ms = (fraction * self.target_span_ms as f64).round() as i64;
        self.target_start + Duration::milliseconds(mapped_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_identity_map_is_exact() {
        let map = IntervalMap::new(at(0, 0, 0), at(12, 0, 0), at(0, 0, 0), at(12, 0, 0))
            .expect("valid interval");
        let t = at(7, 23, 41) + Duration::milliseconds(250);
        assert_eq!(map.apply(t), t);
    }

    #[test]
    fn test_midpoint_maps_to_midpoint() {
        let map = IntervalMap::new(
            at(0, 0, 0),
            at(2, 0, 0),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap(),
        )
        .expect("valid interval");
        assert_eq!(
            map.apply(at(1, 0, 0)),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_endpoints_map_to_endpoints() {
        let target_start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let target_end = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        let map = IntervalMap::new(at(0, 0, 0), at(6, 0, 0), target_start, target_end)
            .expect("valid interval");
        assert_eq!(map.apply(at(0, 0, 0)), target_start);
        assert_eq!(map.apply(at(6, 0, 0)), target_end);
    }

    #[test]
    fn test_extrapolates_past_source_end() {
        // Double-length target: one hour past the source end lands two
        // hours past the target end.
        let map = IntervalMap::new(at(0, 0, 0), at(4, 0, 0), at(0, 0, 0), at(8, 0, 0))
            .expect("valid interval");
        assert_eq!(map.apply(at(5, 0, 0)), at(10, 0, 0));
    }

    #[test]
    fn test_extrapolates_before_source_start() {
        let map = IntervalMap::new(at(2, 0, 0), at(4, 0, 0), at(12, 0, 0), at(14, 0, 0))
            .expect("valid interval");
        assert_eq!(map.apply(at(1, 0, 0)), at(11, 0, 0));
    }

    #[test]
    fn test_round_trip_within_a_millisecond() {
        let forward = IntervalMap::new(at(0, 0, 0), at(9, 0, 0), at(10, 0, 0), at(13, 0, 0))
            .expect("valid interval");
        let backward = IntervalMap::new(at(10, 0, 0), at(13, 0, 0), at(0, 0, 0), at(9, 0, 0))
            .expect("valid interval");
        let t = at(3, 17, 29) + Duration::milliseconds(731);
        let back = backward.apply(forward.apply(t));
        assert!((back - t).num_milliseconds().abs() <= 1);
    }

    #[test]
    fn test_round_trip_outside_the_source_interval() {
        // Extrapolated instants ride the same line, so the composition
        // must return them too, within double-rounding tolerance.
        let forward = IntervalMap::new(at(0, 0, 0), at(9, 0, 0), at(10, 0, 0), at(13, 0, 0))
            .expect("valid interval");
        let backward = IntervalMap::new(at(10, 0, 0), at(13, 0, 0), at(0, 0, 0), at(9, 0, 0))
            .expect("valid interval");
        let past_end = at(10, 0, 0) + Duration::milliseconds(417);
        let back = backward.apply(forward.apply(past_end));
        assert!((back - past_end).num_milliseconds().abs() <= 2);

        let before_start = at(0, 0, 0) - Duration::hours(2) - Duration::milliseconds(293);
        let back = backward.apply(forward.apply(before_start));
        assert!((back - before_start).num_milliseconds().abs() <= 2);
    }

    #[test]
    fn test_degenerate_source_interval_rejected() {
        let result = IntervalMap::new(at(3, 0, 0), at(3, 0, 0), at(0, 0, 0), at(1, 0, 0));
        assert!(matches!(result, Err(EngineError::DegenerateInterval)));
    }
}
