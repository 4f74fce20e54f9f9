use super::{Analyzer, LogSummary, median};
use crate::Result;
use crate::log::LatencyIndex;

pub struct SummaryAnalyzer;

impl Analyzer for SummaryAnalyzer {
    type Output = LogSummary;

    fn analyze(&self, index: &LatencyIndex) -> Result<Self::Output> {
        tracing::debug!("Analyzing log summary statistics");

        let times: Vec<f64> = index.values().flatten().copied().collect();
        let total_requests = times.len();
        let total_time: f64 = times.iter().sum();

        let average_time = if total_requests > 0 {
            total_time / total_requests as f64
        } else {
            0.0
        };

        let summary = LogSummary {
            total_requests,
            unique_urls: index.len(),
            total_time,
            average_time,
            median_time: median(&times).unwrap_or(0.0),
        };

        tracing::info!(
            "Summary analysis complete: {} requests, {} URLs",
            summary.total_requests,
            summary.unique_urls
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_totals() {
        let mut index = LatencyIndex::new();
        index.insert("/a".to_string(), vec![0.5, 1.5]);
        index.insert("/b".to_string(), vec![1.0]);

        let summary = SummaryAnalyzer.analyze(&index).unwrap();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.unique_urls, 2);
        assert_eq!(summary.total_time, 3.0);
        assert_eq!(summary.average_time, 1.0);
        assert_eq!(summary.median_time, 1.0);
    }

    #[test]
    fn test_summary_empty_index() {
        let summary = SummaryAnalyzer.analyze(&LatencyIndex::new()).unwrap();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.average_time, 0.0);
        assert_eq!(summary.median_time, 0.0);
    }
}
