mod locator;
mod parser;
mod reader;

pub use locator::{Compression, LogFileRef, LogLocator, report_file_name};
pub use parser::{RawRecord, decode_line, parse_line};
pub use reader::{ERROR_THRESHOLD, LatencyIndex, LogReader, ReadOutcome};
