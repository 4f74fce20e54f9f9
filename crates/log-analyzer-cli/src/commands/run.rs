use crate::OutputFormat;
use anyhow::{Context, Result};
use log_analyzer_core::config::{Config, RejectedValue, load_external};
use log_analyzer_core::pipeline::{self, LogOutcome, ProcessedLog, Selection};
use std::path::Path;

/// A merged configuration and the file values that were ignored
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub rejected: Vec<RejectedValue>,
}

impl LoadedConfig {
    /// Log every ignored value; call once logging is set up
    pub fn warn_rejected(&self) {
        for value in &self.rejected {
            tracing::warn!("{}", value);
        }
    }
}

/// Merge the YAML file, if given, over the defaults without logging
///
/// The config decides where logs go, so rejected values are returned for the
/// caller to report after the subscriber is installed.
pub fn read_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: Config::default(),
            rejected: Vec::new(),
        });
    };

    let external = load_external(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let (config, rejected) = Config::merge_checked(&Config::default(), &external);
    Ok(LoadedConfig { config, rejected })
}

/// Build the run configuration, overriding defaults with the YAML file if given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = read_config(path)?;
    loaded.warn_rejected();
    Ok(loaded.config)
}

/// Run the report pipeline and print what happened to each log
pub fn execute(
    config: &Config,
    selection: Selection,
    format: OutputFormat,
) -> Result<Vec<ProcessedLog>> {
    tracing::info!(
        "Running analyzer: report size {}, selection {:?}",
        config.report_size,
        selection
    );
    if !config.extra.is_empty() {
        tracing::debug!(
            "Unrecognized config keys: {}",
            config.extra.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let processed = pipeline::run(config, selection)
        .with_context(|| format!("Failed to process logs in {}", config.log_dir.display()))?;

    match format {
        OutputFormat::Json => output_json(&processed)?,
        OutputFormat::Table => output_table(&processed),
        OutputFormat::Pretty => output_pretty(&processed, config),
    }

    Ok(processed)
}

fn output_pretty(processed: &[ProcessedLog], config: &Config) {
    use console::style;

    println!("\n{}", style("Log Analysis Run").bold().cyan());
    println!("{}", style("================").cyan());

    if processed.is_empty() {
        println!(
            "\n  No log files to process in {}",
            config.log_dir.display()
        );
        println!();
        return;
    }

    for item in processed {
        println!("\n{}", style(&item.log.file_name).bold());
        match &item.outcome {
            LogOutcome::Rendered {
                path,
                summary,
                error_rate,
            } => {
                println!("  Status:       {}", style("rendered").green());
                println!("  Report:       {}", path.display());
                println!("  Requests:     {}", summary.total_requests);
                println!("  Unique URLs:  {}", summary.unique_urls);
                println!("  Total Time:   {:.3} s", summary.total_time);
                println!("  Error Rate:   {:.2}%", error_rate * 100.0);
            }
            LogOutcome::Skipped(reason) => {
                println!("  Status:       {}", style("skipped").yellow());
                println!("  Reason:       {}", reason);
            }
        }
    }

    println!(); // trailing newline
}

fn output_json(processed: &[ProcessedLog]) -> Result<()> {
    let items: Vec<serde_json::Value> = processed
        .iter()
        .map(|item| {
            let mut value = serde_json::json!({
                "file": item.log.file_name,
                "date": item.log.date.to_string(),
            });
            let details = match &item.outcome {
                LogOutcome::Rendered {
                    path,
                    summary,
                    error_rate,
                } => serde_json::json!({
                    "status": "rendered",
                    "report": path.display().to_string(),
                    "error_rate": error_rate,
                    "summary": summary,
                }),
                LogOutcome::Skipped(reason) => serde_json::json!({
                    "status": "skipped",
                    "reason": reason.to_string(),
                }),
            };
            if let (Some(target), serde_json::Value::Object(extra)) =
                (value.as_object_mut(), details)
            {
                target.extend(extra);
            }
            value
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn output_table(processed: &[ProcessedLog]) {
    println!("File,Date,Status,Detail");
    for item in processed {
        let (status, detail) = match &item.outcome {
            LogOutcome::Rendered { path, .. } => ("rendered", path.display().to_string()),
            LogOutcome::Skipped(reason) => ("skipped", reason.to_string()),
        };
        println!(
            "{},{},{},{}",
            item.log.file_name, item.log.date, status, detail
        );
    }
}
