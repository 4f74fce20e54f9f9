use super::locator::{Compression, LogFileRef};
use super::parser::{decode_line, parse_line};
use crate::Result;
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Share of unparsable lines above which a log is not reported
pub const ERROR_THRESHOLD: f64 = 0.2;

/// Request times per URL, in the order URLs first appear in the log
pub type LatencyIndex = IndexMap<String, Vec<f64>>;

/// Result of reading one log file
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub index: LatencyIndex,
    pub total_lines: usize,
    pub failed_lines: usize,
}

impl ReadOutcome {
    /// Share of lines that could not be parsed, 0.0 for an empty log
    pub fn error_rate(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        self.failed_lines as f64 / self.total_lines as f64
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.error_rate() > ERROR_THRESHOLD
    }
}

pub struct LogReader;

impl LogReader {
    /// Read and parse a located log file
    pub fn from_log(log: &LogFileRef) -> Result<ReadOutcome> {
        Self::from_path(&log.path, log.compression)
    }

    /// Read and parse a log file at `path`
    pub fn from_path(path: &Path, compression: Compression) -> Result<ReadOutcome> {
        tracing::debug!("Reading log file from: {}", path.display());

        let file = File::open(path)?;
        let outcome = match compression {
            Compression::Gzip => Self::read(BufReader::new(GzDecoder::new(file)))?,
            Compression::None => Self::read(BufReader::new(file))?,
        };

        tracing::info!(
            "Read {} lines from {} ({} unparsable, {} URLs)",
            outcome.total_lines,
            path.display(),
            outcome.failed_lines,
            outcome.index.len()
        );

        Ok(outcome)
    }

    /// Parse every line of `reader` into a latency index
    pub fn read<R: BufRead>(mut reader: R) -> Result<ReadOutcome> {
        let mut outcome = ReadOutcome::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            outcome.total_lines += 1;

            let line = decode_line(&buf);
            match parse_line(&line).into_parts() {
                Some((url, latency)) => outcome.index.entry(url).or_default().push(latency),
                None => {
                    tracing::debug!("Failed to parse line {}: {}", outcome.total_lines, line);
                    outcome.failed_lines += 1;
                }
            }
        }

        Ok(outcome)
    }
}
