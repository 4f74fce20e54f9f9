use crate::OutputFormat;
use anyhow::Result;
use log_analyzer_core::analysis::{Analyzer, LogSummary, SummaryAnalyzer, UrlStats, UrlStatsAnalyzer};
use log_analyzer_core::log::{Compression, LogReader};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics for a single log file, slowest URLs first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStatsReport {
    pub file: String,
    pub total_lines: usize,
    pub failed_lines: usize,
    pub error_rate: f64,
    pub summary: LogSummary,
    pub slowest_urls: Vec<UrlStats>,
}

/// Read a log file and compute its statistics without writing a report
pub fn analyze_log(file: &Path, top: usize) -> Result<LogStatsReport> {
    tracing::debug!("Reading log file: {}", file.display());

    let compression = match file.extension().and_then(|ext| ext.to_str()) {
        Some("gz") | Some("tgz") => Compression::Gzip,
        _ => Compression::None,
    };

    let read = LogReader::from_path(file, compression)?;
    let summary = SummaryAnalyzer.analyze(&read.index)?;

    let mut slowest_urls = UrlStatsAnalyzer.analyze(&read.index)?;
    slowest_urls.sort_by(|a, b| b.time_sum.total_cmp(&a.time_sum));
    slowest_urls.truncate(top);

    Ok(LogStatsReport {
        file: file.display().to_string(),
        total_lines: read.total_lines,
        failed_lines: read.failed_lines,
        error_rate: read.error_rate(),
        summary,
        slowest_urls,
    })
}

pub fn execute(file: &Path, top: usize, format: OutputFormat) -> Result<()> {
    tracing::info!("Extracting statistics from log file: {}", file.display());

    let report = analyze_log(file, top)?;

    match format {
        OutputFormat::Json => output_json(&report)?,
        OutputFormat::Table => output_table(&report),
        OutputFormat::Pretty => output_pretty(&report),
    }

    Ok(())
}

fn output_pretty(report: &LogStatsReport) {
    use console::style;

    println!("\n{}", style("Access Log Statistics").bold().cyan());
    println!("{}", style("=====================").cyan());

    println!("\n{}", style("Summary:").bold());
    println!("  File:            {}", report.file);
    println!("  Lines:           {}", report.total_lines);
    println!("  Unparsable:      {}", report.failed_lines);
    println!("  Error Rate:      {:.2}%", report.error_rate * 100.0);
    println!("  Requests:        {}", report.summary.total_requests);
    println!("  Unique URLs:     {}", report.summary.unique_urls);

    println!("\n{}", style("Request Time:").bold());
    println!("  Total:           {:.3} s", report.summary.total_time);
    println!("  Average:         {:.3} s", report.summary.average_time);
    println!("  Median:          {:.3} s", report.summary.median_time);

    if !report.slowest_urls.is_empty() {
        println!("\n{}", style("Slowest URLs:").bold());
        for (i, url) in report.slowest_urls.iter().enumerate() {
            println!(
                "  {}. [{:.3} s, {} requests, med {:.3} s, max {:.3} s] {}",
                i + 1,
                url.time_sum,
                url.count,
                url.time_med,
                url.time_max,
                url.url
            );
        }
    }

    println!(); // trailing newline
}

fn output_json(report: &LogStatsReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

fn output_table(report: &LogStatsReport) {
    println!("url,count,count_perc,time_sum,time_perc,time_avg,time_max,time_med");
    for url in &report.slowest_urls {
        println!(
            "{},{},{},{},{},{},{},{}",
            url.url,
            url.count,
            url.count_perc,
            url.time_sum,
            url.time_perc,
            url.time_avg,
            url.time_max,
            url.time_med
        );
    }
}
