//! Run reporting.
//!
//! [`RunReport`] aggregates counters across the whole run; [`RunLog`]
//! collects timestamped, leveled lines mirrored live to the console and
//! written to a file at the end. Reporting must never take the pipeline
//! down: file-write problems are logged and swallowed.

use std::collections::HashMap;
use std::path::Path;

use arcade_scraper::{Discovery, SourceFailure};

use crate::dedup::{DuplicateReason, Partition};

/// Counters for one ingestion run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Pages/requests attempted across all adapters.
    pub requests: u32,
    /// Raw items discovered before normalization.
    pub discovered: usize,
    /// Records that normalized successfully.
    pub normalized: usize,
    /// Items skipped during normalization (no usable title/link).
    pub skipped: usize,
    /// Duplicate counts broken down by reason.
    pub duplicates: HashMap<DuplicateReason, usize>,
    /// Unique records actually merged.
    pub merged: usize,
    /// Failed requests/terms with their error messages.
    pub failures: Vec<SourceFailure>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one adapter's discovery into the counters.
    pub fn absorb_discovery(&mut self, discovery: &Discovery) {
        self.requests += discovery.requests;
        self.discovered += discovery.items.len();
        self.failures.extend(discovery.failures.iter().cloned());
    }

    pub fn absorb_partition(&mut self, partition: &Partition) {
        for duplicate in &partition.duplicates {
            *self.duplicates.entry(duplicate.reason).or_insert(0) += 1;
        }
    }

    pub fn total_duplicates(&self) -> usize {
        self.duplicates.values().sum()
    }
}

/// Log line severity. SUCCESS marks milestones a plain INFO would bury.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
        }
    }
}

/// One timestamped log line.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// Collects run log lines and writes the report file.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<LogLine>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message.into());
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    fn push(&mut self, level: LogLevel, message: String) {
        // Mirror to the live console through the log facade.
        match level {
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Warn => log::warn!("{}", message),
            LogLevel::Error => log::error!("{}", message),
            LogLevel::Success => log::info!("[SUCCESS] {}", message),
        }
        self.lines.push(LogLine {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            message,
        });
    }

    /// Render the human-readable end-of-run summary.
    pub fn render_summary(report: &RunReport) -> String {
        let mut out = String::new();
        out.push_str("=== Ingestion Run Summary ===\n");
        out.push_str(&format!("Requests attempted:  {}\n", report.requests));
        out.push_str(&format!("Items discovered:    {}\n", report.discovered));
        out.push_str(&format!("Normalized:          {}\n", report.normalized));
        out.push_str(&format!("Skipped:             {}\n", report.skipped));
        out.push_str(&format!(
            "Duplicates:          {}",
            report.total_duplicates()
        ));
        let breakdown: Vec<String> = DuplicateReason::all()
            .iter()
            .filter_map(|reason| {
                report
                    .duplicates
                    .get(reason)
                    .filter(|n| **n > 0)
                    .map(|n| format!("{reason}: {n}"))
            })
            .collect();
        if breakdown.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!(" ({})\n", breakdown.join(", ")));
        }
        out.push_str(&format!("Merged:              {}\n", report.merged));
        out.push_str(&format!("Failed requests:     {}\n", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                failure.source, failure.target, failure.message
            ));
        }
        out
    }

    /// Write all collected lines plus the summary to a report file.
    ///
    /// Never propagates failure; a run must not fail because its report
    /// could not be written.
    pub fn write_to_file(&self, path: &Path, report: &RunReport) {
        let result = (|| -> std::io::Result<()> {
            use std::io::Write;

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::File::create(path)?;
            for line in &self.lines {
                writeln!(
                    file,
                    "[{}] [{}] {}",
                    line.timestamp,
                    line.level.as_str(),
                    line.message
                )?;
            }
            writeln!(file)?;
            write!(file, "{}", Self::render_summary(report))?;
            Ok(())
        })();

        match result {
            Ok(()) => log::info!("Run report written to {}", path.display()),
            Err(e) => log::warn!("Could not write run report to {}: {}", path.display(), e),
        }
    }
}
