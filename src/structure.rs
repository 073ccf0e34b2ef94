//! Date-to-layout encoding tables.
//!
//! This module is the single source of truth for how a date maps onto a
//! directory tree and a filename date token. Each structure granularity
//! decides how many date fields live in the directory path versus the
//! filename:
//!
//! | Granularity | Directory segments | Filename date token |
//! |-------------|--------------------|---------------------|
//! | `none`      | (none)             | `YYYY-M-D`          |
//! | `year`      | `YYYY`             | `M-D`               |
//! | `month`     | `YYYY/M`           | `D`                 |
//! | `day`       | `YYYY/M/D`         | disallowed          |
//!
//! Month and day are written as plain unpadded integers on both sides;
//! decode never assumes a fixed width. Time tokens (`HHmm`) are always
//! zero-padded to four digits.
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// How finely a date is encoded into the directory tree.
///
/// A closed variant set: every table in this module matches exhaustively,
/// so adding a granularity is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// The full date lives in the filename; no date directories.
    None,
    /// Year directory; month and day in the filename.
    Year,
    /// Year and month directories; day in the filename.
    Month,
    /// Year, month and day directories; no date token in the filename.
    Day,
}

impl Granularity {
    /// Returns the directory segments for a date under this granularity,
    /// outermost first.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use datetidy::structure::Granularity;
    ///
    /// let date = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
    /// assert_eq!(Granularity::Month.dir_segments(date), vec!["2024", "3"]);
    /// assert!(Granularity::None.dir_segments(date).is_empty());
    /// ```
    pub fn dir_segments(&self, date: DateTime<Utc>) -> Vec<String> {
        match self {
            Granularity::None => Vec::new(),
            Granularity::Year => vec![date.year().to_string()],
            Granularity::Month => vec![date.year().to_string(), date.month().to_string()],
            Granularity::Day => vec![
                date.year().to_string(),
                date.month().to_string(),
                date.day().to_string(),
            ],
        }
    }

    /// Returns the filename date token for a date under this granularity.
    ///
    /// Returns `None` for `Day`: with the full date already in the path,
    /// a filename date token is disallowed and callers must treat a
    /// request for one as a configuration error, never a silent drop.
    pub fn date_token(&self, date: DateTime<Utc>) -> Option<String> {
        match self {
            Granularity::None => Some(format!(
                "{}-{}-{}",
                date.year(),
                date.month(),
                date.day()
            )),
            Granularity::Year => Some(format!("{}-{}", date.month(), date.day())),
            Granularity::Month => Some(date.day().to_string()),
            Granularity::Day => None,
        }
    }

    /// Number of numeric directory segments the decode side expects
    /// before the filename.
    pub fn path_segment_count(&self) -> usize {
        match self {
            Granularity::None => 0,
            Granularity::Year => 1,
            Granularity::Month => 2,
            Granularity::Day => 3,
        }
    }

    /// Number of numeric date fields the decode side expects at the
    /// start of the filename stem (before any time token).
    pub fn stem_field_count(&self) -> usize {
        match self {
            Granularity::None => 3,
            Granularity::Year => 2,
            Granularity::Month => 1,
            Granularity::Day => 0,
        }
    }

    /// Human-readable name, matching the serde/CLI spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::None => "none",
            Granularity::Year => "year",
            Granularity::Month => "month",
            Granularity::Day => "day",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Granularity::None),
            "year" => Ok(Granularity::Year),
            "month" => Ok(Granularity::Month),
            "day" => Ok(Granularity::Day),
            other => Err(format!(
                "unknown structure '{}': expected none, year, month or day",
                other
            )),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats the time-of-day token for a date: always four digits, `HHmm`.
pub fn time_token(date: DateTime<Utc>) -> String {
    format!("{:02}{:02}", date.hour(), date.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 8, 7, 0).unwrap()
    }

    #[test]
    fn test_dir_segments_per_granularity() {
        let d = sample();
        assert_eq!(Granularity::None.dir_segments(d), Vec::<String>::new());
        assert_eq!(Granularity::Year.dir_segments(d), vec!["2024"]);
        assert_eq!(Granularity::Month.dir_segments(d), vec!["2024", "3"]);
        assert_eq!(Granularity::Day.dir_segments(d), vec!["2024", "3", "5"]);
    }

    #[test]
    fn test_date_token_per_granularity() {
        let d = sample();
        assert_eq!(Granularity::None.date_token(d), Some("2024-3-5".to_string()));
        assert_eq!(Granularity::Year.date_token(d), Some("3-5".to_string()));
        assert_eq!(Granularity::Month.date_token(d), Some("5".to_string()));
        assert_eq!(Granularity::Day.date_token(d), None);
    }

    #[test]
    fn test_segments_are_unpadded() {
        let d = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(Granularity::Day.dir_segments(d), vec!["2024", "12", "31"]);
        let d = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Granularity::Day.dir_segments(d), vec!["2024", "1", "1"]);
    }

    #[test]
    fn test_time_token_zero_padded() {
        assert_eq!(time_token(sample()), "0807");
        let late = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 0).unwrap();
        assert_eq!(time_token(late), "2359");
    }

    #[test]
    fn test_field_counts_are_complementary() {
        for g in [
            Granularity::None,
            Granularity::Year,
            Granularity::Month,
            Granularity::Day,
        ] {
            assert_eq!(g.path_segment_count() + g.stem_field_count(), 3);
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        for g in [
            Granularity::None,
            Granularity::Year,
            Granularity::Month,
            Granularity::Day,
        ] {
            assert_eq!(g.name().parse::<Granularity>(), Ok(g));
        }
        assert!("week".parse::<Granularity>().is_err());
    }
}
