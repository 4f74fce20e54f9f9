use crate::{Error, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref LOG_FILE_PATTERN: Regex =
        Regex::new(r"^nginx-access-ui\.log-(\d{8})(?:\.(gz|tgz))?$").unwrap();
}

/// How a log file is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// A log file that follows the rotation naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileRef {
    pub path: PathBuf,
    pub file_name: String,
    pub date: NaiveDate,
    pub compression: Compression,
}

impl LogFileRef {
    /// Build a reference from a file name inside `dir`
    ///
    /// Returns `None` when the name does not follow the convention or the
    /// embedded date is not a real calendar day.
    pub fn from_file_name(dir: &Path, file_name: &str) -> Option<Self> {
        let captures = LOG_FILE_PATTERN.captures(file_name)?;

        let date = match NaiveDate::parse_from_str(&captures[1], "%Y%m%d") {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!("Skipping {} with invalid date: {}", file_name, e);
                return None;
            }
        };

        let compression = match captures.get(2) {
            Some(_) => Compression::Gzip,
            None => Compression::None,
        };

        Some(Self {
            path: dir.join(file_name),
            file_name: file_name.to_string(),
            date,
            compression,
        })
    }

    /// Date in the `YYYYMMDD` form used by report names
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

/// File name of the HTML report for a given log date
pub fn report_file_name(date: NaiveDate) -> String {
    format!("report-{}.html", date.format("%Y%m%d"))
}

pub struct LogLocator;

impl LogLocator {
    /// List every log file in `dir` that follows the naming convention
    ///
    /// Entries are returned in directory listing order. A directory with no
    /// matching files yields an empty list; a directory with no entries at
    /// all is an error.
    pub fn find_logs(dir: &Path) -> Result<Vec<LogFileRef>> {
        tracing::debug!("Looking for logs in: {}", dir.display());

        let mut seen_any = false;
        let mut logs = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            seen_any = true;

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if let Some(log) = LogFileRef::from_file_name(dir, file_name) {
                tracing::info!("Found log file: {}", log.file_name);
                logs.push(log);
            }
        }

        if !seen_any {
            return Err(Error::EmptyLogDir(dir.display().to_string()));
        }

        Ok(logs)
    }

    /// Pick the log with the most recent date
    ///
    /// When two files carry the same date the one listed last wins.
    pub fn latest(logs: &[LogFileRef]) -> Option<&LogFileRef> {
        logs.iter().fold(None, |best, log| match best {
            Some(current) if current.date > log.date => Some(current),
            _ => Some(log),
        })
    }

    /// Find the most recent log in `dir`
    pub fn find_latest(dir: &Path) -> Result<Option<LogFileRef>> {
        let logs = Self::find_logs(dir)?;
        Ok(Self::latest(&logs).cloned())
    }

    /// Check whether a report for `date` is already present in `report_dir`
    pub fn report_exists(report_dir: &Path, date: NaiveDate) -> bool {
        report_dir.join(report_file_name(date)).is_file()
    }
}
