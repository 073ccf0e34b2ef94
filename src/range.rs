//! Half-open date range filtering.
//!
//! A range is `[start, end)`: the start bound is inclusive, the end bound
//! exclusive. Either bound may be absent; a range with neither bound
//! accepts every date. The default window used when a caller supplies no
//! range at all is the rolling 31 days ending now.
use chrono::{DateTime, Duration, Utc};

/// An optional-bounded, half-open `[start, end)` interval over UTC dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// A range covering the 31 days up to now: `[now − 31d, now)`.
    ///
    /// This is the deliberate default applied when a caller supplies
    /// neither a start nor an end bound.
    pub fn default_window() -> Self {
        let end = Utc::now();
        Self {
            start: Some(end - Duration::days(31)),
            end: Some(end),
        }
    }

    /// True when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Half-open membership test: `date ≥ start` (when set) and
    /// `date < end` (when set). An unbounded range contains everything.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        if let Some(start) = self.start
            && date < start
        {
            return false;
        }
        if let Some(end) = self.end
            && date >= end
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_start_inclusive_end_exclusive() {
        let range = DateRange {
            start: Some(utc(2024, 3, 1)),
            end: Some(utc(2024, 4, 1)),
        };
        assert!(range.contains(utc(2024, 3, 1)));
        assert!(range.contains(utc(2024, 3, 15)));
        assert!(!range.contains(utc(2024, 4, 1)));
        assert!(!range.contains(utc(2024, 2, 29)));
    }

    #[test]
    fn test_unbounded_range_contains_everything() {
        let range = DateRange::default();
        assert!(range.is_unbounded());
        assert!(range.contains(utc(1970, 1, 1)));
        assert!(range.contains(utc(2999, 12, 31)));
    }

    #[test]
    fn test_start_only() {
        let range = DateRange {
            start: Some(utc(2024, 3, 1)),
            end: None,
        };
        assert!(range.contains(utc(2999, 1, 1)));
        assert!(!range.contains(utc(2024, 2, 1)));
    }

    #[test]
    fn test_end_only() {
        let range = DateRange {
            start: None,
            end: Some(utc(2024, 3, 1)),
        };
        assert!(range.contains(utc(1970, 1, 1)));
        assert!(!range.contains(utc(2024, 3, 1)));
    }

    #[test]
    fn test_default_window_is_31_days_ending_now() {
        let before = Utc::now();
        let window = DateRange::default_window();
        let after = Utc::now();

        let start = window.start.expect("window has a start");
        let end = window.end.expect("window has an end");
        assert_eq!(end - start, Duration::days(31));
        assert!(end >= before && end <= after);
    }
}
