//! datetidy - date-keyed file tree organization
//!
//! This library reorganizes a tree of files into a date-keyed
//! directory/filename layout and inverts that layout when reading
//! previously organized files back. The core is the date–location codec:
//! encoding a date into directory segments and a filename token under a
//! chosen structure granularity, decoding a path back into a date, and
//! filtering recovered dates against a half-open range.

pub mod cli;
pub mod config;
pub mod filename;
pub mod logger;
pub mod organizer;
pub mod range;
pub mod resolver;
pub mod structure;
pub mod traversal;

pub use config::{Config, ConfigError, ConfigFile, Overrides};
pub use filename::{FilenameComposer, FilenameOptions};
pub use logger::{ConsoleLogger, LogLevel, Logger, MemoryLogger};
pub use organizer::{OrganizeError, Organizer};
pub use range::DateRange;
pub use resolver::resolve_date;
pub use structure::Granularity;
pub use traversal::{DirectoryTraversal, TraversalError, build_glob_pattern};

pub use cli::{Cli, run};
