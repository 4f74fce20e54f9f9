mod summary;
mod url_stats;

pub use summary::SummaryAnalyzer;
pub use url_stats::{UrlStatsAnalyzer, median, round_up};

use crate::log::LatencyIndex;
use serde::{Deserialize, Serialize};

/// File-level totals for one log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total_requests: usize,
    pub unique_urls: usize,
    pub total_time: f64,
    pub average_time: f64,
    pub median_time: f64,
}

/// Aggregated request times for a single URL
///
/// Field order is the key order of the report's JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlStats {
    pub url: String,
    pub count: usize,
    pub count_perc: f64,
    pub time_sum: f64,
    pub time_perc: f64,
    pub time_avg: f64,
    pub time_max: f64,
    pub time_med: f64,
}

pub trait Analyzer {
    type Output;

    fn analyze(&self, index: &LatencyIndex) -> crate::Result<Self::Output>;
}
