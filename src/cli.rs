//! Command-line interface module for datetidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and conversion into configuration overrides
//! - The `organize` command (move files into the date-keyed layout)
//! - The `scan` command (read an organized tree back without moving)
//! - Progress display and the optional JSON run report

use crate::config::{Config, ConfigFile, Overrides, TokenToggles};
use crate::logger::{ConsoleLogger, Logger};
use crate::organizer::Organizer;
use crate::range::DateRange;
use crate::structure::Granularity;
use crate::traversal::DirectoryTraversal;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "datetidy",
    version,
    about = "Organize files into date-keyed directory trees and read them back by date range"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move files from the input tree into the date-keyed output layout.
    Organize(OrganizeArgs),
    /// List organized files and their recovered dates without moving anything.
    Scan(ScanArgs),
}

/// Arguments shared by every command.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Input directory to read from.
    pub input: PathBuf,

    /// Recurse into subdirectories.
    #[arg(short, long)]
    pub recursive: bool,

    /// Date structure of the input tree (none, year, month, day).
    #[arg(long, value_parser = parse_granularity)]
    pub input_structure: Option<Granularity>,

    /// Input filenames carry no date token.
    #[arg(long)]
    pub no_input_date: bool,

    /// Input filenames carry no HHmm time token.
    #[arg(long)]
    pub no_input_time: bool,

    /// Only consider files with this extension, without the leading dot.
    /// Repeatable.
    #[arg(long = "ext")]
    pub extensions: Vec<String>,

    /// Inclusive lower date bound (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_bound)]
    pub since: Option<DateTime<Utc>>,

    /// Exclusive upper date bound (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_bound)]
    pub until: Option<DateTime<Utc>>,

    /// Accept every date instead of the default 31-day window.
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub all_dates: bool,

    /// Path to a configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print per-file debug detail.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output directory to write the date-keyed layout into.
    pub output: PathBuf,

    /// Date structure of the output tree (none, year, month, day).
    #[arg(long, value_parser = parse_granularity)]
    pub output_structure: Option<Granularity>,

    /// Omit the date token from output filenames.
    #[arg(long)]
    pub no_date: bool,

    /// Omit the HHmm time token from output filenames.
    #[arg(long)]
    pub no_time: bool,

    /// Omit the subject token from output filenames.
    #[arg(long)]
    pub no_subject: bool,

    /// Show what would happen without moving anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// One performed (or planned) move, for the run report.
#[derive(Debug, Serialize)]
struct MoveRecord {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct OrganizeReport {
    dry_run: bool,
    processed: usize,
    moves: Vec<MoveRecord>,
}

#[derive(Debug, Serialize)]
struct ScanEntry {
    path: String,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    matched: usize,
    entries: Vec<ScanEntry>,
}

/// Runs the parsed command line to completion.
///
/// Configuration problems and enumeration failures surface as the `Err`
/// string; per-file problems have already been logged and absorbed by
/// then.
pub fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Organize(args) => run_organize(args),
        Command::Scan(args) => run_scan(args),
    }
}

fn run_organize(args: OrganizeArgs) -> Result<(), String> {
    let file = ConfigFile::load(args.common.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let overrides = Overrides {
        input_directory: Some(args.common.input.clone()),
        output_directory: Some(args.output.clone()),
        recursive: args.common.recursive.then_some(true),
        input_structure: args.common.input_structure,
        output_structure: args.output_structure,
        input_filename: TokenToggles {
            date: args.common.no_input_date.then_some(false),
            time: args.common.no_input_time.then_some(false),
            subject: None,
        },
        output_filename: TokenToggles {
            date: args.no_date.then_some(false),
            time: args.no_time.then_some(false),
            subject: args.no_subject.then_some(false),
        },
        extensions: (!args.common.extensions.is_empty()).then(|| args.common.extensions.clone()),
        start: args.common.since,
        end: args.common.until,
        ..Default::default()
    };
    let config = Config::resolve(file, overrides).map_err(|e| e.to_string())?;

    let logger = ConsoleLogger::new(args.common.verbose);
    let traversal = DirectoryTraversal::new(&config, &logger);
    let organizer = Organizer::new(&config, &logger);
    let range = effective_range(&config, args.common.all_dates);

    if args.dry_run {
        logger.info(&format!(
            "DRY RUN: Analyzing contents of: {}",
            config.input_directory.display()
        ));
    } else {
        logger.info(&format!(
            "Organizing contents of: {}",
            config.input_directory.display()
        ));
    }

    let progress = create_progress_bar();
    let mut moves: Vec<MoveRecord> = Vec::new();
    let processed = traversal
        .process(
            |path, resolved| {
                let destination = organizer.place(path, resolved, args.dry_run)?;
                moves.push(MoveRecord {
                    from: path.display().to_string(),
                    to: destination.display().to_string(),
                });
                progress.inc(1);
                Ok(())
            },
            range,
        )
        .map_err(|e| e.to_string())?;
    progress.finish_and_clear();

    let report = OrganizeReport {
        dry_run: args.dry_run,
        processed,
        moves,
    };

    if args.common.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering report: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    if report.dry_run {
        for record in &report.moves {
            println!(" - {}", record.from);
            println!("   → Would move to {}", record.to);
        }
        println!("\n✓ Dry run complete. No files were modified.");
    } else {
        println!("\nOrganization complete!");
    }
    println!(
        "{} {}",
        report.processed,
        if report.processed == 1 {
            "file placed"
        } else {
            "files placed"
        }
    );
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<(), String> {
    let file = ConfigFile::load(args.common.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let overrides = Overrides {
        input_directory: Some(args.common.input.clone()),
        // Scanning never writes; the input root stands in for the
        // mandatory output directory.
        output_directory: Some(args.common.input.clone()),
        recursive: args.common.recursive.then_some(true),
        input_structure: args.common.input_structure,
        input_filename: TokenToggles {
            date: args.common.no_input_date.then_some(false),
            time: args.common.no_input_time.then_some(false),
            subject: None,
        },
        extensions: (!args.common.extensions.is_empty()).then(|| args.common.extensions.clone()),
        start: args.common.since,
        end: args.common.until,
        ..Default::default()
    };
    let config = Config::resolve(file, overrides).map_err(|e| e.to_string())?;

    let logger = ConsoleLogger::new(args.common.verbose);
    let traversal = DirectoryTraversal::new(&config, &logger);
    let range = effective_range(&config, args.common.all_dates);

    let mut entries: Vec<ScanEntry> = Vec::new();
    let matched = traversal
        .process(
            |path, resolved| {
                entries.push(ScanEntry {
                    path: path.display().to_string(),
                    date: resolved.map(|d| d.to_rfc3339()),
                });
                Ok(())
            },
            range,
        )
        .map_err(|e| e.to_string())?;

    let report = ScanReport { matched, entries };
    if args.common.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering report: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    for entry in &report.entries {
        match &entry.date {
            Some(date) => println!(" - {} [{}]", entry.path, date),
            None => println!(" - {}", entry.path),
        }
    }
    println!(
        "\n{} {} matched",
        report.matched,
        if report.matched == 1 { "file" } else { "files" }
    );
    Ok(())
}

/// The range handed to the traversal: `--all-dates` forces the
/// accept-everything range, explicit bounds travel via the resolved
/// config, and nothing at all selects the default rolling window.
fn effective_range(config: &Config, all_dates: bool) -> Option<DateRange> {
    if all_dates {
        Some(DateRange::default())
    } else {
        config.date_range
    }
}

/// Spinner-style progress for operations whose total is unknown until
/// the walk completes.
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {pos} {msg}")
            .expect("Invalid progress bar template"),
    );
    pb.set_message("files placed");
    pb
}

/// Parses a CLI date bound: RFC 3339, or a bare date taken as UTC
/// midnight.
fn parse_bound(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", value, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{}'", value))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn parse_granularity(value: &str) -> Result<Granularity, String> {
    value.parse()
}
