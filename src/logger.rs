//! Minimal logging capability, injected by reference.
//!
//! Components take `&dyn Logger` from their caller instead of reaching
//! for a global or special-casing the console. [`ConsoleLogger`] is the
//! CLI's styled implementation; [`MemoryLogger`] captures records so
//! tests (and embedding callers) can assert on what was logged.

use colored::*;
use std::cell::RefCell;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// The single logging capability the rest of the crate depends on.
pub trait Logger {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Console logger with the CLI's styling: cyan info, yellow ⚠ warnings,
/// red ✗ errors. Debug lines are printed dimmed and only when verbose.
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.verbose {
            println!("{}", message.dimmed());
        }
    }

    fn info(&self, message: &str) {
        println!("{}", message.cyan());
    }

    fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }
}

/// Collects log records in memory.
///
/// Interior mutability keeps the `Logger` methods `&self`; traversal is
/// strictly sequential so a `RefCell` is sufficient.
#[derive(Default)]
pub struct MemoryLogger {
    records: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records captured so far, in order.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.borrow().clone()
    }

    /// Number of records at the given level.
    pub fn count(&self, level: LogLevel) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_in_order() {
        let logger = MemoryLogger::new();
        logger.info("first");
        logger.warn("second");
        logger.error("third");

        let records = logger.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], (LogLevel::Info, "first".to_string()));
        assert_eq!(records[1], (LogLevel::Warn, "second".to_string()));
        assert_eq!(records[2], (LogLevel::Error, "third".to_string()));
    }

    #[test]
    fn test_memory_logger_counts_by_level() {
        let logger = MemoryLogger::new();
        logger.debug("a");
        logger.debug("b");
        logger.error("c");
        assert_eq!(logger.count(LogLevel::Debug), 2);
        assert_eq!(logger.count(LogLevel::Error), 1);
        assert_eq!(logger.count(LogLevel::Warn), 0);
    }
}
