//! Layered configuration resolved into one immutable value.
//!
//! Three layers feed the final configuration: hard-coded defaults, an
//! optional TOML config file, and command-line overrides. They are merged
//! exactly once, here, into a fully-populated [`Config`]; no component
//! downstream ever observes a partial or optional field.
//!
//! # Configuration File Format
//!
//! ```toml
//! timezone = "Europe/Rome"
//! recursive = true
//! extensions = ["md", "txt"]
//!
//! [input]
//! directory = "notes"
//! structure = "month"
//!
//! [input.filename]
//! date = true
//! time = true
//! subject = true
//!
//! [output]
//! directory = "organized"
//! structure = "day"
//!
//! [range]
//! start = "2024-01-01T00:00:00Z"
//! end = "2024-04-01T00:00:00Z"
//! ```

use crate::filename::FilenameOptions;
use crate::range::DateRange;
use crate::structure::Granularity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading, merging or validating configuration.
///
/// All of these are fatal to the whole run and raised before any file is
/// inspected.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
    /// No directory supplied for the named side ("input" or "output").
    MissingDirectory(&'static str),
    /// An extension entry is empty or carries a leading dot.
    InvalidExtension(String),
    /// The timezone string is not an IANA-shaped identifier.
    InvalidTimezone(String),
    /// A range bound could not be parsed as an RFC 3339 timestamp.
    InvalidDateBound {
        /// The raw value from the config file.
        value: String,
        /// Why it failed to parse.
        reason: String,
    },
    /// The range start is after its end.
    StartAfterEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The `date` filename token was requested together with `day`
    /// structure, which already encodes the full date in the path.
    DateTokenWithDayStructure {
        /// Which side of the configuration conflicts ("input" or "output").
        side: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::MissingDirectory(side) => {
                write!(f, "No {} directory configured", side)
            }
            ConfigError::InvalidExtension(ext) => {
                write!(
                    f,
                    "Invalid extension '{}': expected a bare extension without a leading dot",
                    ext
                )
            }
            ConfigError::InvalidTimezone(tz) => {
                write!(f, "Invalid timezone '{}': expected an IANA identifier", tz)
            }
            ConfigError::InvalidDateBound { value, reason } => {
                write!(f, "Invalid date bound '{}': {}", value, reason)
            }
            ConfigError::StartAfterEnd { start, end } => {
                write!(
                    f,
                    "Range start {} is after its end {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )
            }
            ConfigError::DateTokenWithDayStructure { side } => {
                write!(
                    f,
                    "The 'date' filename token cannot be combined with 'day' {} structure: \
                     the path already encodes the full date",
                    side
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Partial token toggles as they appear in a config file or on the CLI.
///
/// Unset fields fall through to the layer below.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenToggles {
    pub date: Option<bool>,
    pub time: Option<bool>,
    pub subject: Option<bool>,
}

impl TokenToggles {
    fn apply(&self, options: FilenameOptions) -> FilenameOptions {
        FilenameOptions {
            date: self.date.unwrap_or(options.date),
            time: self.time.unwrap_or(options.time),
            subject: self.subject.unwrap_or(options.subject),
        }
    }
}

/// One side (input or output) of the on-disk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideFile {
    pub directory: Option<PathBuf>,
    pub structure: Option<Granularity>,
    #[serde(default)]
    pub filename: TokenToggles,
}

/// Range bounds as they appear in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeFile {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// The raw, possibly-partial configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub timezone: Option<String>,
    pub recursive: Option<bool>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub input: SideFile,
    #[serde(default)]
    pub output: SideFile,
    #[serde(default)]
    pub range: RangeFile,
}

impl ConfigFile {
    /// Load a configuration file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. `.datetidyrc.toml` in the current directory
    /// 3. `~/.config/datetidy/config.toml`
    /// 4. Empty defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read or
    /// parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datetidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Command-line overrides, the highest-priority configuration layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_directory: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub timezone: Option<String>,
    pub recursive: Option<bool>,
    pub input_structure: Option<Granularity>,
    pub output_structure: Option<Granularity>,
    pub input_filename: TokenToggles,
    pub output_filename: TokenToggles,
    pub extensions: Option<Vec<String>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// The fully-resolved, immutable configuration every component consumes.
///
/// Built once by [`Config::resolve`]; by construction there are no
/// partially-populated fields and all cross-field contracts have been
/// checked.
#[derive(Debug, Clone)]
pub struct Config {
    /// IANA timezone identifier, carried for collaborators that stamp
    /// local dates. The codec itself operates on UTC.
    pub timezone: String,
    pub recursive: bool,
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub input_structure: Granularity,
    pub output_structure: Granularity,
    pub input_filename_options: FilenameOptions,
    pub output_filename_options: FilenameOptions,
    /// Extension allow-list, without leading dots. Empty means all files.
    pub extensions: Vec<String>,
    /// User-supplied range bounds, if any. `None` means the caller gets
    /// the default rolling window at traversal time.
    pub date_range: Option<DateRange>,
}

impl Config {
    /// Merges the three configuration layers and validates every
    /// cross-field contract. This is the only constructor; failing any
    /// check here aborts the run before a single file is touched.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let timezone = overrides
            .timezone
            .or(file.timezone)
            .unwrap_or_else(|| "UTC".to_string());
        validate_timezone(&timezone)?;

        let input_directory = overrides
            .input_directory
            .or(file.input.directory)
            .ok_or(ConfigError::MissingDirectory("input"))?;
        let output_directory = overrides
            .output_directory
            .or(file.output.directory)
            .ok_or(ConfigError::MissingDirectory("output"))?;

        let input_structure = overrides
            .input_structure
            .or(file.input.structure)
            .unwrap_or(Granularity::None);
        let output_structure = overrides
            .output_structure
            .or(file.output.structure)
            .unwrap_or(Granularity::None);

        let input_filename_options = overrides
            .input_filename
            .apply(file.input.filename.apply(FilenameOptions::default()));
        let output_filename_options = overrides
            .output_filename
            .apply(file.output.filename.apply(FilenameOptions::default()));

        if input_structure == Granularity::Day && input_filename_options.date {
            return Err(ConfigError::DateTokenWithDayStructure { side: "input" });
        }
        if output_structure == Granularity::Day && output_filename_options.date {
            return Err(ConfigError::DateTokenWithDayStructure { side: "output" });
        }

        let extensions = overrides
            .extensions
            .or(file.extensions)
            .unwrap_or_default();
        for ext in &extensions {
            if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '*', '{', '}']) {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
        }

        let start = match overrides.start {
            Some(start) => Some(start),
            None => parse_bound(file.range.start.as_deref())?,
        };
        let end = match overrides.end {
            Some(end) => Some(end),
            None => parse_bound(file.range.end.as_deref())?,
        };
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(ConfigError::StartAfterEnd { start, end });
        }
        let date_range = if start.is_none() && end.is_none() {
            None
        } else {
            Some(DateRange { start, end })
        };

        Ok(Self {
            timezone,
            recursive: overrides.recursive.or(file.recursive).unwrap_or(false),
            input_directory,
            output_directory,
            input_structure,
            output_structure,
            input_filename_options,
            output_filename_options,
            extensions,
            date_range,
        })
    }

    /// True when the input layout carries a recoverable date: either the
    /// path encodes all three date fields (`day` structure) or the
    /// filename carries a date token.
    pub fn structured(&self) -> bool {
        self.input_structure == Granularity::Day || self.input_filename_options.date
    }
}

fn validate_timezone(tz: &str) -> Result<(), ConfigError> {
    let valid = !tz.is_empty()
        && tz
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '+' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimezone(tz.to_string()))
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(value)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|e| ConfigError::InvalidDateBound {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
