//! The fixed working day and the duration arithmetic shared by the
//! attendance and leave engines.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt;

pub const WORK_START: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(t) => t,
    None => panic!("invalid work start"),
};

pub const WORK_END: NaiveTime = match NaiveTime::from_hms_opt(17, 0, 0) {
    Some(t) => t,
    None => panic!("invalid work end"),
};

/// A non-negative span of whole seconds, rendered as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Elapsed(u64);

impl Elapsed {
    pub const ZERO: Elapsed = Elapsed(0);

    pub fn from_seconds(seconds: u64) -> Self {
        Elapsed(seconds)
    }

    /// Magnitude of `delta`, truncated to whole seconds.
    pub fn from_delta(delta: TimeDelta) -> Self {
        Elapsed(delta.num_seconds().unsigned_abs())
    }

    pub fn as_seconds(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Absolute time between `reference` and `moment`. Callers decide whether
/// the sign matters.
pub fn elapsed_since(reference: NaiveDateTime, moment: NaiveDateTime) -> Elapsed {
    Elapsed::from_delta(moment - reference)
}

/// Whole minutes between two instants, never negative.
pub fn minutes_between(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    (a - b).num_minutes().abs()
}

/// Calendar days from `from` to `to`, both ends included.
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn elapsed_is_formatted_as_hh_mm_ss() {
        assert_eq!(elapsed_since(at(9, 0, 0), at(9, 30, 0)).to_string(), "00:30:00");
        assert_eq!(elapsed_since(at(17, 0, 0), at(18, 4, 9)).to_string(), "01:04:09");
        assert_eq!(Elapsed::ZERO.to_string(), "00:00:00");
    }

    #[test]
    fn elapsed_ignores_direction() {
        assert_eq!(
            elapsed_since(at(9, 0, 0), at(8, 45, 0)),
            elapsed_since(at(8, 45, 0), at(9, 0, 0)),
        );
        assert_eq!(elapsed_since(at(9, 0, 0), at(8, 45, 0)).as_seconds(), 900);
    }

    #[test]
    fn minutes_are_truncated_and_non_negative() {
        assert_eq!(minutes_between(at(18, 0, 0), at(9, 0, 0)), 540);
        assert_eq!(minutes_between(at(9, 0, 0), at(18, 0, 0)), 540);
        assert_eq!(minutes_between(at(9, 10, 59), at(9, 0, 0)), 10);
    }

    #[test]
    fn inclusive_day_count() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert_eq!(days_inclusive(d(2), d(2)), 1);
        assert_eq!(days_inclusive(d(2), d(6)), 5);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Elapsed::from_seconds(3600)).unwrap();
        assert_eq!(json, "\"01:00:00\"");
    }
}
