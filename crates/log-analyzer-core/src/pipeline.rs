use crate::Result;
use crate::analysis::{Analyzer, LogSummary, SummaryAnalyzer, UrlStatsAnalyzer};
use crate::config::Config;
use crate::log::{ERROR_THRESHOLD, LogFileRef, LogLocator, LogReader};
use crate::report::{Report, ReportWriter};
use std::fmt;
use std::path::PathBuf;

/// Which of the located logs a run processes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Only the log with the most recent date
    #[default]
    Latest,
    /// Every log, oldest first
    All,
}

/// Why a log produced no report
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A report for the log's date already exists
    AlreadyReported,
    /// Too many lines could not be parsed
    ErrorRateExceeded(f64),
    /// The log contained no parsable requests
    NoData,
    /// The log could not be opened or decompressed
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyReported => write!(f, "report already exists"),
            SkipReason::ErrorRateExceeded(rate) => write!(
                f,
                "parse error rate {:.4} exceeds {}",
                rate, ERROR_THRESHOLD
            ),
            SkipReason::NoData => write!(f, "no parsable requests"),
            SkipReason::Unreadable(err) => write!(f, "cannot read log: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogOutcome {
    Rendered {
        path: PathBuf,
        summary: LogSummary,
        error_rate: f64,
    },
    Skipped(SkipReason),
}

/// What happened to one log during a run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedLog {
    pub log: LogFileRef,
    pub outcome: LogOutcome,
}

/// Locate logs in the configured directory and report on the selected ones
///
/// Fails when the log directory cannot be read or has no entries, or when a
/// report cannot be written. Skipped logs, including unreadable ones, are not
/// errors.
pub fn run(config: &Config, selection: Selection) -> Result<Vec<ProcessedLog>> {
    tracing::info!(
        "Starting run: log dir {}, report dir {}",
        config.log_dir.display(),
        config.report_dir.display()
    );

    let logs = LogLocator::find_logs(&config.log_dir)?;
    let targets: Vec<LogFileRef> = match selection {
        Selection::Latest => LogLocator::latest(&logs).cloned().into_iter().collect(),
        Selection::All => {
            let mut all = logs;
            all.sort_by_key(|log| log.date);
            all
        }
    };

    if targets.is_empty() {
        tracing::info!("No log files to process in {}", config.log_dir.display());
        return Ok(Vec::new());
    }

    let writer = match &config.report_template {
        Some(template) => ReportWriter::with_template_file(&config.report_dir, template)?,
        None => ReportWriter::new(&config.report_dir),
    };

    targets
        .into_iter()
        .map(|log| process_log(log, config, &writer))
        .collect()
}

/// Read, aggregate and render a single log
pub fn process_log(log: LogFileRef, config: &Config, writer: &ReportWriter) -> Result<ProcessedLog> {
    let outcome = build_report(&log, config, writer)?;
    match &outcome {
        LogOutcome::Rendered { path, .. } => {
            tracing::info!("Log file {} was rendered to {}", log.file_name, path.display())
        }
        LogOutcome::Skipped(reason) => {
            tracing::warn!("Skipping log file {}: {}", log.file_name, reason)
        }
    }
    Ok(ProcessedLog { log, outcome })
}

fn build_report(log: &LogFileRef, config: &Config, writer: &ReportWriter) -> Result<LogOutcome> {
    if LogLocator::report_exists(&config.report_dir, log.date) {
        return Ok(LogOutcome::Skipped(SkipReason::AlreadyReported));
    }

    let read = match LogReader::from_log(log) {
        Ok(read) => read,
        Err(e) => return Ok(LogOutcome::Skipped(SkipReason::Unreadable(e.to_string()))),
    };
    let error_rate = read.error_rate();
    tracing::info!(
        "Parse error rate for {} is {:.4} (threshold {})",
        log.file_name,
        error_rate,
        ERROR_THRESHOLD
    );

    if read.exceeds_threshold() {
        return Ok(LogOutcome::Skipped(SkipReason::ErrorRateExceeded(error_rate)));
    }
    if read.index.is_empty() {
        return Ok(LogOutcome::Skipped(SkipReason::NoData));
    }

    let summary = SummaryAnalyzer.analyze(&read.index)?;
    let stats = UrlStatsAnalyzer.analyze(&read.index)?;

    let report = Report::select(log.date, stats, config.report_size);
    let path = writer.write(&report)?;

    Ok(LogOutcome::Rendered {
        path,
        summary,
        error_rate,
    })
}
