//! Date recovery from organized paths.
//!
//! This module inverts the encoding tables in [`crate::structure`]: given a
//! path relative to the input root and the granularity it was written
//! under, it recovers the original UTC date at minute precision.
//!
//! Failure here is a value, not an error: anything that cannot be decoded
//! returns `None` so a traversal can skip one malformed file and continue.
use crate::structure::Granularity;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use std::path::Path;

/// Recovers the date encoded in `relative_path` under `granularity`.
///
/// The numeric directory prefix supplies 0–3 date fields depending on the
/// granularity; the remaining fields are read from the start of the
/// filename stem. The stem is stripped of leading/trailing
/// non-alphanumeric characters and split on `-` or `_`. A trailing `HHmm`
/// time token is consumed only when `parse_time` is set (it must be when
/// the files were written with a time token); otherwise the recovered
/// time is midnight.
///
/// Returns `None` when any field is non-numeric, out of range
/// (month 1–12, day 1–31, hour 0–23, minute 0–59), or when the
/// constructed date does not read back with the parsed fields — the
/// latter rejects calendar rollover such as February 30th instead of
/// silently drifting forward.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use datetidy::resolver::resolve_date;
/// use datetidy::structure::Granularity;
/// use std::path::Path;
///
/// let date = resolve_date(Path::new("2024/3/15-0830-note.txt"), Granularity::Month, true);
/// assert_eq!(date, Some(Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap()));
/// ```
pub fn resolve_date(
    relative_path: &Path,
    granularity: Granularity,
    parse_time: bool,
) -> Option<DateTime<Utc>> {
    let mut fields: Vec<u32> = Vec::with_capacity(3);

    // Leading numeric path segments, parsed as plain integers with no
    // width assumption.
    let segment_count = granularity.path_segment_count();
    let parent = relative_path.parent().unwrap_or_else(|| Path::new(""));
    let mut components = parent.components();
    for _ in 0..segment_count {
        let component = components.next()?;
        let segment = component.as_os_str().to_str()?;
        fields.push(segment.parse::<u32>().ok()?);
    }

    // Remaining date fields come from the front of the filename stem.
    let stem = relative_path.file_stem()?.to_str()?;
    let stem = stem.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    let mut tokens = stem.split(['-', '_']).filter(|t| !t.is_empty());
    for _ in 0..granularity.stem_field_count() {
        fields.push(tokens.next()?.parse::<u32>().ok()?);
    }

    let (hour, minute) = if parse_time {
        parse_time_token(tokens.next()?)?
    } else {
        (0, 0)
    };

    let &[year, month, day] = fields.as_slice() else {
        return None;
    };
    // A year segment too large for i32 must fail here, not wrap.
    let year = i32::try_from(year).ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    if hour > 23 || minute > 59 {
        return None;
    }

    let date = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()?;

    // Re-read the fields we just encoded. A mismatch means the calendar
    // shifted the date underneath us; treat it as unparseable.
    if date.year() != year
        || date.month() != month
        || date.day() != day
        || date.hour() != hour
        || date.minute() != minute
    {
        return None;
    }

    Some(date)
}

/// Parses an `HHmm` token: exactly four ASCII digits.
fn parse_time_token(token: &str) -> Option<(u32, u32)> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour = token[..2].parse::<u32>().ok()?;
    let minute = token[2..].parse::<u32>().ok()?;
    Some((hour, minute))
}
