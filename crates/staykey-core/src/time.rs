//! Time types for stays and calendar blocks.
//!
//! This module provides [`StayRange`], the half-open UTC interval used for
//! every overlap decision in the system, plus the conversions applied to
//! date-only and floating calendar values.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` in UTC.
///
/// Used for reservation stays, external calendar blocks, and access-code
/// validity windows. Two ranges conflict exactly when
/// `a.start < b.end && a.end > b.start`; a checkout that equals another
/// stay's checkin does not conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    /// Start of the range (inclusive).
    pub start: DateTime<Utc>,
    /// End of the range (exclusive).
    pub end: DateTime<Utc>,
}

impl StayRange {
    /// Creates a new stay range.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "StayRange start must be <= end");
        Self { start, end }
    }

    /// Creates a stay range, returning `None` when `start > end`.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Returns the duration of the range.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the number of nights spanned by the range.
    pub fn nights(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days()
    }

    /// Checks whether a datetime falls within the range.
    ///
    /// Half-open semantics: the start is included, the end is not.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks whether a datetime falls within the range, end included.
    ///
    /// Access-code validity uses this form: a code is still usable at the
    /// exact checkout instant.
    pub fn contains_inclusive(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt <= self.end
    }

    /// Checks whether this range overlaps another.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Converts a calendar date to midnight in the local timezone, as UTC.
///
/// Date-only calendar values (8-character `DTSTART`/`DTEND`) denote whole
/// days in the property's local context; falls back to UTC midnight when the
/// local instant does not exist (DST gap).
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    local_instant(naive)
}

/// Converts a floating (timezone-less) datetime to UTC via the local timezone.
pub fn local_instant(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> StayRange {
        StayRange::new(start, end)
    }

    #[test]
    fn creation_and_duration() {
        let r = range(utc(2024, 6, 1, 14, 0, 0), utc(2024, 6, 4, 11, 0, 0));
        assert_eq!(r.duration(), Duration::hours(69));
        assert_eq!(r.nights(), 3);
    }

    #[test]
    #[should_panic(expected = "start must be <= end")]
    fn inverted_range_panics() {
        range(utc(2024, 6, 4, 0, 0, 0), utc(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn try_new_rejects_inverted() {
        assert!(StayRange::try_new(utc(2024, 6, 4, 0, 0, 0), utc(2024, 6, 1, 0, 0, 0)).is_none());
        assert!(StayRange::try_new(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 4, 0, 0, 0)).is_some());
    }

    #[test]
    fn contains_half_open() {
        let r = range(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 4, 0, 0, 0));

        assert!(r.contains(utc(2024, 6, 1, 0, 0, 0)));
        assert!(r.contains(utc(2024, 6, 3, 23, 59, 59)));
        assert!(!r.contains(utc(2024, 6, 4, 0, 0, 0)));
        assert!(!r.contains(utc(2024, 5, 31, 23, 59, 59)));
    }

    #[test]
    fn contains_inclusive_keeps_end() {
        let r = range(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 4, 0, 0, 0));

        assert!(r.contains_inclusive(utc(2024, 6, 4, 0, 0, 0)));
        assert!(!r.contains_inclusive(utc(2024, 6, 4, 0, 0, 1)));
    }

    mod overlap {
        use super::*;

        #[test]
        fn plain_overlap() {
            let a = range(utc(2024, 7, 1, 0, 0, 0), utc(2024, 7, 5, 0, 0, 0));
            let b = range(utc(2024, 7, 4, 0, 0, 0), utc(2024, 7, 8, 0, 0, 0));
            assert!(a.overlaps(&b));
            assert!(b.overlaps(&a));
        }

        #[test]
        fn containment_is_overlap() {
            let outer = range(utc(2024, 7, 1, 0, 0, 0), utc(2024, 7, 10, 0, 0, 0));
            let inner = range(utc(2024, 7, 3, 0, 0, 0), utc(2024, 7, 5, 0, 0, 0));
            assert!(outer.overlaps(&inner));
            assert!(inner.overlaps(&outer));
        }

        #[test]
        fn back_to_back_does_not_overlap() {
            // Checkout at another stay's checkin is a legal turnover.
            let a = range(utc(2024, 7, 1, 0, 0, 0), utc(2024, 7, 5, 0, 0, 0));
            let b = range(utc(2024, 7, 5, 0, 0, 0), utc(2024, 7, 8, 0, 0, 0));
            assert!(!a.overlaps(&b));
            assert!(!b.overlaps(&a));
        }

        #[test]
        fn disjoint_does_not_overlap() {
            let a = range(utc(2024, 7, 1, 0, 0, 0), utc(2024, 7, 3, 0, 0, 0));
            let b = range(utc(2024, 7, 10, 0, 0, 0), utc(2024, 7, 12, 0, 0, 0));
            assert!(!a.overlaps(&b));
        }
    }

    #[test]
    fn local_midnight_matches_local_instant() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let expected = local_instant(date.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(local_midnight(date), expected);
    }

    #[test]
    fn serde_roundtrip() {
        let r = range(utc(2024, 6, 1, 14, 0, 0), utc(2024, 6, 4, 11, 0, 0));
        let json = serde_json::to_string(&r).unwrap();
        let parsed: StayRange = serde_json::from_str(&json).unwrap();
        assert_eq!(r, parsed);
    }
}
