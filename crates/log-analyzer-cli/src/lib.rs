use clap::ValueEnum;

pub mod commands;

/// How `run` and `stats` print their results to stdout
///
/// Logging is separate and always goes to stderr or the configured log file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Styled, human-readable summary
    Pretty,
    /// Pretty-printed JSON, for scripts
    Json,
    /// Comma-separated rows with a header line
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        }
    }
}
