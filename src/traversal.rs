//! Directory traversal orchestration.
//!
//! This module enumerates candidate files under the input root via a
//! derived glob pattern, recovers a date per file in structured mode,
//! filters by date range, and drives a caller-supplied callback. Per-file
//! problems are isolated: a file that cannot be decoded is skipped with a
//! warning, a callback failure is logged and skipped, and the traversal
//! keeps going either way. Only enumeration failures from the underlying
//! walker abort the run.
use crate::config::Config;
use crate::logger::Logger;
use crate::range::DateRange;
use crate::resolver::resolve_date;
use chrono::{DateTime, Utc};
use globset::GlobBuilder;
use std::path::Path;
use walkdir::WalkDir;

/// Errors that abort a traversal outright.
#[derive(Debug)]
pub enum TraversalError {
    /// The derived glob pattern failed to compile.
    InvalidPattern { pattern: String, reason: String },
    /// The directory walker itself failed; per the error policy this is
    /// not caught per file.
    Enumeration { source: walkdir::Error },
}

impl std::fmt::Display for TraversalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid enumeration pattern '{}': {}", pattern, reason)
            }
            TraversalError::Enumeration { source } => {
                write!(f, "Directory enumeration failed: {}", source)
            }
        }
    }
}

impl std::error::Error for TraversalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraversalError::InvalidPattern { .. } => None,
            TraversalError::Enumeration { source } => Some(source),
        }
    }
}

/// Result type alias for per-file callbacks.
pub type CallbackResult = Result<(), Box<dyn std::error::Error>>;

/// Builds the glob pattern matching candidate files.
///
/// `recursive` prepends `**/`. A non-empty extension allow-list appends
/// `.{a,b}` (a single extension collapses to `.a`); an empty list falls
/// back to `.*` when non-recursive and to nothing extra when recursive:
///
/// ```
/// use datetidy::traversal::build_glob_pattern;
///
/// assert_eq!(build_glob_pattern(false, &["md".to_string()]), "*.md");
/// assert_eq!(build_glob_pattern(true, &["md".to_string()]), "**/*.md");
/// assert_eq!(build_glob_pattern(false, &[]), "*.*");
/// assert_eq!(build_glob_pattern(true, &[]), "**/*");
/// ```
pub fn build_glob_pattern(recursive: bool, extensions: &[String]) -> String {
    let prefix = if recursive { "**/" } else { "" };
    let suffix = match extensions {
        [] => {
            if recursive {
                String::new()
            } else {
                ".*".to_string()
            }
        }
        [only] => format!(".{}", only),
        many => format!(".{{{}}}", many.join(",")),
    };
    format!("{}*{}", prefix, suffix)
}

/// Enumerates organized files and drives a callback per accepted file.
///
/// Strictly sequential: each file is fully handled before the next is
/// considered, and the running success counter is the only mutable state.
pub struct DirectoryTraversal<'a> {
    config: &'a Config,
    logger: &'a dyn Logger,
}

impl<'a> DirectoryTraversal<'a> {
    pub fn new(config: &'a Config, logger: &'a dyn Logger) -> Self {
        Self { config, logger }
    }

    /// Walks the input root once and invokes `callback` for every file
    /// that matches the pattern and, in structured mode, carries a date
    /// inside the requested range. Passing no range selects the default
    /// rolling 31-day window; pass an explicit unbounded [`DateRange`] to
    /// accept every date.
    ///
    /// In unstructured mode the callback receives `None` for the date and
    /// no range filtering happens.
    ///
    /// Returns the number of files the callback completed successfully.
    /// Callback failures are logged with their full error chain and do
    /// not stop the traversal; enumeration failures propagate.
    pub fn process<F>(&self, mut callback: F, range: Option<DateRange>) -> Result<usize, TraversalError>
    where
        F: FnMut(&Path, Option<DateTime<Utc>>) -> CallbackResult,
    {
        let pattern = build_glob_pattern(self.config.recursive, &self.config.extensions);
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| TraversalError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        let structured = self.config.structured();
        let range = range.unwrap_or_else(DateRange::default_window);

        let mut walker = WalkDir::new(&self.config.input_directory);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut processed = 0usize;
        for entry in walker {
            let entry = entry.map_err(|source| TraversalError::Enumeration { source })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.config.input_directory)
                .unwrap_or(entry.path());
            if !matcher.is_match(relative) {
                continue;
            }

            let resolved = if structured {
                match resolve_date(
                    relative,
                    self.config.input_structure,
                    self.config.input_filename_options.time,
                ) {
                    Some(date) => Some(date),
                    None => {
                        self.logger.warn(&format!(
                            "Skipping {}: no date could be recovered from its path",
                            relative.display()
                        ));
                        continue;
                    }
                }
            } else {
                None
            };

            if let Some(date) = resolved
                && !range.contains(date)
            {
                self.logger.debug(&format!(
                    "Skipping {}: {} is outside the requested range",
                    relative.display(),
                    date.to_rfc3339()
                ));
                continue;
            }

            match callback(entry.path(), resolved) {
                Ok(()) => processed += 1,
                Err(error) => {
                    self.logger.error(&format!(
                        "Callback failed for {}: {}",
                        entry.path().display(),
                        error_chain(error.as_ref())
                    ));
                }
            }
        }

        self.logger
            .info(&format!("Processed {} file(s)", processed));
        Ok(processed)
    }
}

/// Renders an error with its full source chain, outermost first.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, Overrides};
    use crate::logger::{LogLevel, MemoryLogger};
    use crate::structure::Granularity;
    use chrono::TimeZone;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_for(
        input: &Path,
        structure: Granularity,
        recursive: bool,
        extensions: &[&str],
    ) -> Config {
        let overrides = Overrides {
            input_directory: Some(input.to_path_buf()),
            output_directory: Some(PathBuf::from("unused-out")),
            input_structure: Some(structure),
            recursive: Some(recursive),
            extensions: Some(extensions.iter().map(|e| e.to_string()).collect()),
            ..Default::default()
        };
        Config::resolve(ConfigFile::default(), overrides).expect("valid test config")
    }

    fn unbounded() -> Option<DateRange> {
        Some(DateRange::default())
    }

    #[test]
    fn test_pattern_table() {
        assert_eq!(build_glob_pattern(false, &["md".to_string()]), "*.md");
        assert_eq!(build_glob_pattern(true, &["md".to_string()]), "**/*.md");
        assert_eq!(
            build_glob_pattern(false, &["md".to_string(), "txt".to_string()]),
            "*.{md,txt}"
        );
        assert_eq!(build_glob_pattern(false, &[]), "*.*");
        assert_eq!(build_glob_pattern(true, &[]), "**/*");
    }

    #[test]
    fn test_structured_traversal_resolves_dates() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("2024/3")).expect("date dirs");
        fs::write(dir.path().join("2024/3/15-0830-note.txt"), "x").expect("file");

        let config = config_for(dir.path(), Granularity::Month, true, &["txt"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let mut seen = Vec::new();
        let processed = traversal
            .process(
                |_, date| {
                    seen.push(date);
                    Ok(())
                },
                unbounded(),
            )
            .expect("traversal succeeds");

        assert_eq!(processed, 1);
        assert_eq!(
            seen,
            vec![Some(Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap())]
        );
    }

    #[test]
    fn test_unparseable_file_is_warned_and_skipped() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("2024/3")).expect("date dirs");
        fs::write(dir.path().join("2024/3/15-0830-good.txt"), "x").expect("file");
        fs::write(dir.path().join("2024/3/not-a-date.txt"), "x").expect("file");

        let config = config_for(dir.path(), Granularity::Month, true, &["txt"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let processed = traversal
            .process(|_, _| Ok(()), unbounded())
            .expect("traversal succeeds");

        assert_eq!(processed, 1);
        assert_eq!(logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_one_failing_callback_does_not_stop_the_batch() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("2024/3")).expect("date dirs");
        for day in 1..=10 {
            fs::write(
                dir.path().join(format!("2024/3/{}-0900-note.txt", day)),
                "x",
            )
            .expect("file");
        }

        let config = config_for(dir.path(), Granularity::Month, true, &["txt"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let mut attempts = 0;
        let processed = traversal
            .process(
                |_, _| {
                    attempts += 1;
                    if attempts == 4 {
                        Err("simulated callback failure".into())
                    } else {
                        Ok(())
                    }
                },
                unbounded(),
            )
            .expect("traversal completes despite the failure");

        assert_eq!(attempts, 10);
        assert_eq!(processed, 9);
        assert_eq!(logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_out_of_range_file_is_skipped_with_debug() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("2024/3")).expect("date dirs");
        fs::create_dir_all(dir.path().join("2024/5")).expect("date dirs");
        fs::write(dir.path().join("2024/3/15-0830-in.txt"), "x").expect("file");
        fs::write(dir.path().join("2024/5/1-0830-out.txt"), "x").expect("file");

        let config = config_for(dir.path(), Granularity::Month, true, &["txt"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
        };
        let processed = traversal
            .process(|_, _| Ok(()), Some(range))
            .expect("traversal succeeds");

        assert_eq!(processed, 1);
        assert_eq!(logger.count(LogLevel::Debug), 1);
    }

    #[test]
    fn test_default_window_excludes_old_files() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("2001/1")).expect("date dirs");
        fs::write(dir.path().join("2001/1/1-0000-ancient.txt"), "x").expect("file");

        let config = config_for(dir.path(), Granularity::Month, true, &["txt"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        // No range supplied: the rolling 31-day window applies.
        let processed = traversal
            .process(|_, _| Ok(()), None)
            .expect("traversal succeeds");
        assert_eq!(processed, 0);
    }

    #[test]
    fn test_extension_filter_non_recursive() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("2024-3-15-0830-a.md"), "x").expect("file");
        fs::write(dir.path().join("2024-3-15-0830-b.txt"), "x").expect("file");
        fs::create_dir_all(dir.path().join("nested")).expect("subdir");
        fs::write(dir.path().join("nested/2024-3-15-0830-c.md"), "x").expect("file");

        let config = config_for(dir.path(), Granularity::None, false, &["md"]);
        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let mut names = Vec::new();
        traversal
            .process(
                |path, _| {
                    names.push(path.file_name().unwrap().to_string_lossy().to_string());
                    Ok(())
                },
                unbounded(),
            )
            .expect("traversal succeeds");

        assert_eq!(names, vec!["2024-3-15-0830-a.md"]);
    }

    #[test]
    fn test_unstructured_mode_passes_none_and_ignores_range() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("whatever.txt"), "x").expect("file");

        let overrides = Overrides {
            input_directory: Some(dir.path().to_path_buf()),
            output_directory: Some(PathBuf::from("unused-out")),
            input_structure: Some(Granularity::None),
            input_filename: crate::config::TokenToggles {
                date: Some(false),
                time: Some(false),
                subject: None,
            },
            extensions: Some(vec!["txt".to_string()]),
            ..Default::default()
        };
        let config = Config::resolve(ConfigFile::default(), overrides).expect("valid config");
        assert!(!config.structured());

        let logger = MemoryLogger::new();
        let traversal = DirectoryTraversal::new(&config, &logger);

        let mut seen = Vec::new();
        // The tight range would exclude everything in structured mode.
        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(1971, 1, 2, 0, 0, 0).unwrap()),
        };
        let processed = traversal
            .process(
                |_, date| {
                    seen.push(date);
                    Ok(())
                },
                Some(range),
            )
            .expect("traversal succeeds");

        assert_eq!(processed, 1);
        assert_eq!(seen, vec![None]);
    }
}
