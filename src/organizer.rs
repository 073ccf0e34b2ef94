//! Write-side pipeline: placing files into the date-keyed layout.
//!
//! The organizer owns everything between a source file plus its logical
//! date and the final path on disk: the output directory tree (created
//! idempotently), the composed filename, and collision disambiguation
//! when two inputs compose to the same name.
use crate::config::{Config, ConfigError};
use crate::filename::FilenameComposer;
use crate::logger::Logger;
use chrono::{DateTime, Timelike, Utc};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on collision-counter probing for a single destination.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Errors that can occur while placing a file.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create an output directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a source file for hashing and type detection.
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its destination.
    FileMoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Every candidate collision suffix was taken.
    TooManyCollisions { path: PathBuf },
    /// Filename composition rejected the configuration.
    Compose(ConfigError),
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizeError::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            OrganizeError::ReadFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            OrganizeError::FileMoveFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            OrganizeError::TooManyCollisions { path } => {
                write!(
                    f,
                    "Gave up finding a free name for {} after {} attempts",
                    path.display(),
                    MAX_COLLISION_SUFFIX
                )
            }
            OrganizeError::Compose(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrganizeError::DirectoryCreationFailed { source, .. }
            | OrganizeError::ReadFailed { source, .. }
            | OrganizeError::FileMoveFailed { source, .. } => Some(source),
            OrganizeError::TooManyCollisions { .. } => None,
            OrganizeError::Compose(source) => Some(source),
        }
    }
}

impl From<ConfigError> for OrganizeError {
    fn from(source: ConfigError) -> Self {
        OrganizeError::Compose(source)
    }
}

/// Places files into the configured output layout.
pub struct Organizer<'a> {
    config: &'a Config,
    logger: &'a dyn Logger,
    composer: FilenameComposer,
    // Destinations already handed out by this organizer. Dry runs never
    // write, so collision probing must consult this set as well as the
    // filesystem or every planned duplicate would report the same path.
    planned: RefCell<HashSet<PathBuf>>,
}

impl<'a> Organizer<'a> {
    pub fn new(config: &'a Config, logger: &'a dyn Logger) -> Self {
        let composer = FilenameComposer::new(
            config.output_structure,
            config.output_filename_options,
        );
        Self {
            config,
            logger,
            composer,
            planned: RefCell::new(HashSet::new()),
        }
    }

    /// The output directory a date maps to, without touching the
    /// filesystem.
    pub fn output_directory_for(&self, date: DateTime<Utc>) -> PathBuf {
        let mut path = self.config.output_directory.clone();
        for segment in self.config.output_structure.dir_segments(date) {
            path.push(segment);
        }
        path
    }

    /// Builds and creates the output directory tree for a date.
    /// Creation is create-if-absent; calling this repeatedly for the
    /// same date is harmless.
    pub fn construct_output_directory(
        &self,
        date: DateTime<Utc>,
    ) -> Result<PathBuf, OrganizeError> {
        let path = self.output_directory_for(date);
        fs::create_dir_all(&path).map_err(|source| OrganizeError::DirectoryCreationFailed {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Composes the output filename (without extension) for a date.
    pub fn construct_filename(
        &self,
        date: DateTime<Utc>,
        kind: &str,
        hash: &str,
        subject: Option<&str>,
    ) -> Result<String, ConfigError> {
        self.composer.construct(date, kind, hash, subject)
    }

    /// Moves one source file into the output layout and returns its
    /// final path.
    ///
    /// `resolved` is the date recovered from the input layout; when the
    /// input is unstructured (`None`) the file's modification time is
    /// used instead, truncated to minute precision. With `dry_run` set,
    /// the planned destination is computed and logged but nothing on
    /// disk changes; destinations handed out earlier in the same run
    /// still count as taken when disambiguating.
    pub fn place(
        &self,
        source: &Path,
        resolved: Option<DateTime<Utc>>,
        dry_run: bool,
    ) -> Result<PathBuf, OrganizeError> {
        let date = match resolved {
            Some(date) => date,
            None => modified_date(source)?,
        };

        let data = fs::read(source).map_err(|e| OrganizeError::ReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;
        let kind = detect_kind(&data, source);
        let hash = short_hash(&data);
        let subject = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string());

        let stem = self
            .composer
            .construct(date, &kind, &hash, subject.as_deref())?;
        let filename = match source.extension() {
            Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
            None => stem,
        };

        let directory = if dry_run {
            self.output_directory_for(date)
        } else {
            self.construct_output_directory(date)?
        };
        let destination = self.disambiguate(directory.join(&filename))?;
        self.planned.borrow_mut().insert(destination.clone());

        if dry_run {
            self.logger.info(&format!(
                "[dry run] {} -> {}",
                source.display(),
                destination.display()
            ));
            return Ok(destination);
        }

        fs::rename(source, &destination).map_err(|e| OrganizeError::FileMoveFailed {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;
        self.logger.debug(&format!(
            "{} -> {}",
            source.display(),
            destination.display()
        ));
        Ok(destination)
    }

    /// Returns `candidate` if free, otherwise the first `stem-2`,
    /// `stem-3`, ... variant that is. A name counts as taken when it
    /// exists on disk or was already planned by this organizer.
    fn disambiguate(&self, candidate: PathBuf) -> Result<PathBuf, OrganizeError> {
        let planned = self.planned.borrow();
        let taken = |path: &Path| path.exists() || planned.contains(path);

        if !taken(&candidate) {
            return Ok(candidate);
        }
        let stem = candidate
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = candidate.extension().map(|e| e.to_string_lossy().to_string());
        let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

        for counter in 2..=MAX_COLLISION_SUFFIX {
            let name = match &extension {
                Some(ext) => format!("{}-{}.{}", stem, counter, ext),
                None => format!("{}-{}", stem, counter),
            };
            let next = parent.join(name);
            if !taken(&next) {
                return Ok(next);
            }
        }
        Err(OrganizeError::TooManyCollisions { path: candidate })
    }
}

/// Picks a `kind` token for a file: content sniffing first, extension
/// second, `"bin"` as the last resort.
pub fn detect_kind(data: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.extension().to_string();
    }
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

/// Short content hash: the first 8 hex characters of SHA-256.
pub fn short_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// The file's modification time as a UTC date, truncated to the minute.
fn modified_date(path: &Path) -> Result<DateTime<Utc>, OrganizeError> {
    let metadata = fs::metadata(path).map_err(|e| OrganizeError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let modified = metadata.modified().map_err(|e| OrganizeError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let date = DateTime::<Utc>::from(modified);
    Ok(date
        .with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date))
}
