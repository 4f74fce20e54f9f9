use super::{Analyzer, UrlStats};
use crate::Result;
use crate::log::LatencyIndex;

/// Round up to three decimal places
///
/// Values that are already exact at the third decimal are left unchanged.
pub fn round_up(value: f64) -> f64 {
    let scaled = value * 1000.0;
    let truncated = scaled.trunc();
    if scaled == truncated {
        truncated / 1000.0
    } else {
        (truncated + 1.0) / 1000.0
    }
}

/// Median of unsorted values, the mean of the two central values for an
/// even count
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Computes per-URL statistics for a latency index
pub struct UrlStatsAnalyzer;

impl Analyzer for UrlStatsAnalyzer {
    type Output = Vec<UrlStats>;

    fn analyze(&self, index: &LatencyIndex) -> Result<Self::Output> {
        tracing::debug!("Aggregating request times for {} URLs", index.len());

        let total_count: usize = index.values().map(Vec::len).sum();
        let total_time: f64 = index.values().map(|times| times.iter().sum::<f64>()).sum();

        let mut stats = Vec::with_capacity(index.len());

        for (url, times) in index {
            let Some(time_med) = median(times) else {
                continue;
            };

            let count = times.len();
            let time_sum: f64 = times.iter().sum();
            let time_max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            // All request times can be zero; the share of zero is zero
            let time_perc = if total_time > 0.0 {
                round_up(time_sum / total_time)
            } else {
                0.0
            };

            stats.push(UrlStats {
                url: url.clone(),
                count,
                count_perc: round_up(count as f64 / total_count as f64),
                time_sum: round_up(time_sum),
                time_perc,
                time_avg: round_up(time_sum / count as f64),
                time_max,
                time_med: round_up(time_med),
            });
        }

        tracing::info!(
            "Aggregation complete: {} URLs, {} requests, {:.3}s total",
            stats.len(),
            total_count,
            total_time
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> LatencyIndex {
        let mut index = LatencyIndex::new();
        index.insert("/api/v2/banner/171".to_string(), vec![0.198, 0.641, 0.781]);
        index.insert("/api/v2/banner/181".to_string(), vec![0.187, 0.878, 0.543]);
        index.insert(
            "/api/v2/banner/193".to_string(),
            vec![0.193, 0.832, 0.245, 0.981],
        );
        index
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(0.2961), 0.297);
        assert_eq!(round_up(0.296), 0.296);
        assert_eq!(round_up(1.0), 1.0);
        assert_eq!(round_up(0.0), 0.0);
        assert_eq!(round_up(0.5385), 0.539);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[0.198, 0.641, 0.781]), Some(0.641));
        assert_eq!(median(&[0.781, 0.198, 0.641]), Some(0.641));
        assert_eq!(median(&[0.193, 0.832, 0.245, 0.981]), Some((0.245 + 0.832) / 2.0));
        assert_eq!(median(&[0.4]), Some(0.4));
        assert_eq!(median(&[] as &[f64]), None);
    }

    #[test]
    fn test_aggregate_sample() {
        let stats = UrlStatsAnalyzer.analyze(&sample_index()).unwrap();
        assert_eq!(stats.len(), 3);

        assert_eq!(
            stats[0],
            UrlStats {
                url: "/api/v2/banner/171".to_string(),
                count: 3,
                count_perc: 0.3,
                time_sum: 1.62,
                time_perc: 0.296,
                time_avg: 0.54,
                time_max: 0.781,
                time_med: 0.641,
            }
        );
        assert_eq!(
            stats[1],
            UrlStats {
                url: "/api/v2/banner/181".to_string(),
                count: 3,
                count_perc: 0.3,
                time_sum: 1.608,
                time_perc: 0.294,
                time_avg: 0.536,
                time_max: 0.878,
                time_med: 0.543,
            }
        );
        assert_eq!(
            stats[2],
            UrlStats {
                url: "/api/v2/banner/193".to_string(),
                count: 4,
                count_perc: 0.4,
                time_sum: 2.251,
                time_perc: 0.411,
                time_avg: 0.563,
                time_max: 0.981,
                time_med: 0.539,
            }
        );
    }

    #[test]
    fn test_percentages_sum_to_one() {
        let stats = UrlStatsAnalyzer.analyze(&sample_index()).unwrap();
        let slack = 0.001 * stats.len() as f64;

        let count_total: f64 = stats.iter().map(|s| s.count_perc).sum();
        let time_total: f64 = stats.iter().map(|s| s.time_perc).sum();

        assert!((count_total - 1.0).abs() <= slack, "count_perc sum {count_total}");
        assert!((time_total - 1.0).abs() <= slack, "time_perc sum {time_total}");
    }

    #[test]
    fn test_max_not_below_avg() {
        let stats = UrlStatsAnalyzer.analyze(&sample_index()).unwrap();
        for s in &stats {
            assert!(s.time_max >= s.time_avg, "{}: max below avg", s.url);
        }
    }

    #[test]
    fn test_empty_index() {
        let stats = UrlStatsAnalyzer.analyze(&LatencyIndex::new()).unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_zero_total_time() {
        let mut index = LatencyIndex::new();
        index.insert("/a".to_string(), vec![0.0, 0.0]);
        index.insert("/b".to_string(), vec![0.0]);

        let stats = UrlStatsAnalyzer.analyze(&index).unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.time_perc == 0.0));
        assert_eq!(stats[0].count_perc, 0.667);
        assert_eq!(stats[1].count_perc, 0.334);
    }
}
