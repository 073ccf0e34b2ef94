//! Filename composition from ordered optional tokens.
//!
//! A composed filename is `[date?, time?, hash, kind, subject?]` joined by
//! `-`, where the date and time tokens appear only when enabled in the
//! configured token set and the date token's shape comes from the output
//! structure's format table. Subjects are sanitized so they can never
//! collide with the `-`/`_` token separators the decode side splits on.
use crate::config::ConfigError;
use crate::structure::{Granularity, time_token};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator joining filename tokens.
pub const SEPARATOR: char = '-';

/// Fallback subject when sanitization leaves nothing behind.
const EMPTY_SUBJECT: &str = "untitled";

/// Which optional tokens participate in a composed filename.
///
/// The hash and kind tokens are always present; these toggles govern the
/// optional ones. Order in the filename is fixed regardless:
/// date, time, hash, kind, subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameOptions {
    pub date: bool,
    pub time: bool,
    pub subject: bool,
}

impl Default for FilenameOptions {
    fn default() -> Self {
        Self {
            date: true,
            time: true,
            subject: true,
        }
    }
}

/// Builds final filename strings for one (structure, token set) pair.
///
/// A pure function of its inputs: identical `(date, kind, hash, subject)`
/// always yield the identical string. Disambiguating two files that
/// compose to the same name is deliberately not handled here; the
/// organizer owns that.
pub struct FilenameComposer {
    structure: Granularity,
    options: FilenameOptions,
    disallowed: Regex,
    separator_runs: Regex,
}

impl FilenameComposer {
    /// Creates a composer for the given output structure and token set.
    ///
    /// The sanitizer regexes are compiled once here, not per call.
    pub fn new(structure: Granularity, options: FilenameOptions) -> Self {
        Self {
            structure,
            options,
            disallowed: Regex::new(r"[^A-Za-z0-9._-]").expect("valid sanitizer pattern"),
            separator_runs: Regex::new(r"[-_]+").expect("valid separator pattern"),
        }
    }

    /// Composes the filename (without extension) for a date.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DateTokenWithDayStructure`] when the token
    /// set enables `date` under `day` structure. The date is never
    /// silently dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use datetidy::filename::{FilenameComposer, FilenameOptions};
    /// use datetidy::structure::Granularity;
    ///
    /// let composer = FilenameComposer::new(Granularity::Month, FilenameOptions::default());
    /// let date = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
    /// let name = composer.construct(date, "txt", "a1b2c3d4", Some("meeting notes")).unwrap();
    /// assert_eq!(name, "15-0830-a1b2c3d4-txt-meeting_notes");
    /// ```
    pub fn construct(
        &self,
        date: DateTime<Utc>,
        kind: &str,
        hash: &str,
        subject: Option<&str>,
    ) -> Result<String, ConfigError> {
        let mut parts: Vec<String> = Vec::with_capacity(5);

        if self.options.date {
            let token = self
                .structure
                .date_token(date)
                .ok_or(ConfigError::DateTokenWithDayStructure { side: "output" })?;
            parts.push(token);
        }
        if self.options.time {
            parts.push(time_token(date));
        }
        parts.push(hash.to_string());
        parts.push(kind.to_string());
        if self.options.subject
            && let Some(subject) = subject
        {
            parts.push(self.sanitize_subject(subject));
        }

        Ok(parts.join(&SEPARATOR.to_string()))
    }

    /// Reduces an arbitrary subject to a token-safe fragment.
    ///
    /// Characters outside `[A-Za-z0-9._-]` become `_`, every run of
    /// separator-class characters (`-` or `_`) collapses to a single `_`,
    /// and leading/trailing `_` are stripped. Hyphens never survive, so a
    /// subject cannot masquerade as extra date/time tokens when the path
    /// is decoded later. An empty result becomes `"untitled"`.
    pub fn sanitize_subject(&self, raw: &str) -> String {
        let replaced = self.disallowed.replace_all(raw, "_");
        let collapsed = self.separator_runs.replace_all(&replaced, "_");
        let trimmed = collapsed.trim_matches('_');
        if trimmed.is_empty() {
            EMPTY_SUBJECT.to_string()
        } else {
            trimmed.to_string()
        }
    }
}
