mod writer;

pub use writer::ReportWriter;

use crate::Result;
use crate::analysis::UrlStats;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

/// Placeholder in the HTML template that receives the report rows
pub const TEMPLATE_PLACEHOLDER: &str = "$table_json";

lazy_static! {
    // `$table_json` as a whole identifier, or the braced `${table_json}`
    static ref PLACEHOLDER_PATTERN: Regex =
        Regex::new(r"\$(?:table_json\b|\{table_json\})").unwrap();
}

/// Whether `template` has somewhere to put the report rows
pub fn has_placeholder(template: &str) -> bool {
    PLACEHOLDER_PATTERN.is_match(template)
}

/// Built-in HTML shell used when no template is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("report.html");

/// The rows selected for one log date
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub date: NaiveDate,
    pub rows: Vec<UrlStats>,
}

impl Report {
    /// Order stats by ascending `time_sum` and keep the first `limit`
    ///
    /// The sort is stable, so URLs with equal totals keep log order.
    pub fn select(date: NaiveDate, mut stats: Vec<UrlStats>, limit: usize) -> Self {
        stats.sort_by(|a, b| a.time_sum.total_cmp(&b.time_sum));
        stats.truncate(limit);
        Self { date, rows: stats }
    }

    /// Rows as a JSON array that is safe to embed in a `<script>` block
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string(&self.rows)?;
        Ok(json.replace("</", "<\\/"))
    }

    /// Substitute the rows into `template`
    pub fn render(&self, template: &str) -> Result<String> {
        let json = self.to_json()?;
        Ok(PLACEHOLDER_PATTERN
            .replace_all(template, NoExpand(&json))
            .into_owned())
    }

    /// Selected URLs, one per line
    pub fn url_list(&self) -> String {
        self.rows.iter().fold(String::new(), |mut out, row| {
            out.push_str(&row.url);
            out.push('\n');
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(url: &str, time_sum: f64) -> UrlStats {
        UrlStats {
            url: url.to_string(),
            count: 1,
            count_perc: 0.5,
            time_sum,
            time_perc: 0.5,
            time_avg: time_sum,
            time_max: time_sum,
            time_med: time_sum,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 6, 30).unwrap()
    }

    #[test]
    fn test_select_sorts_ascending_and_truncates() {
        let report = Report::select(
            date(),
            vec![stats("/slow", 3.0), stats("/fast", 1.0), stats("/mid", 2.0)],
            2,
        );

        let urls: Vec<&str> = report.rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["/fast", "/mid"]);
    }

    #[test]
    fn test_select_keeps_order_of_ties() {
        let report = Report::select(
            date(),
            vec![stats("/b", 1.0), stats("/a", 1.0), stats("/c", 0.5)],
            10,
        );

        let urls: Vec<&str> = report.rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["/c", "/b", "/a"]);
    }

    #[test]
    fn test_to_json_key_order() {
        let report = Report::select(date(), vec![stats("/a", 1.0)], 10);
        let json = report.to_json().unwrap();

        assert_eq!(
            json,
            r#"[{"url":"/a","count":1,"count_perc":0.5,"time_sum":1.0,"time_perc":0.5,"time_avg":1.0,"time_max":1.0,"time_med":1.0}]"#
        );
    }

    #[test]
    fn test_to_json_escapes_script_end() {
        let report = Report::select(date(), vec![stats("/</script>", 1.0)], 10);
        let json = report.to_json().unwrap();

        assert!(!json.contains("</script>"));
        let rows: Vec<UrlStats> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows[0].url, "/</script>");
    }

    #[test]
    fn test_render_substitutes_placeholder() {
        let report = Report::select(date(), vec![stats("/a", 1.0)], 10);
        let html = report.render("<script>var table = $table_json;</script>").unwrap();

        assert!(html.starts_with("<script>var table = [{\"url\":\"/a\""));
        assert!(!html.contains(TEMPLATE_PLACEHOLDER));
    }

    #[test]
    fn test_render_leaves_longer_identifiers_alone() {
        let report = Report::select(date(), vec![stats("/a", 1.0)], 10);
        let html = report
            .render("var $table_json_meta = 1; var t = ${table_json}; var u = $table_json")
            .unwrap();

        assert_eq!(
            html.matches(r#"[{"url":"/a""#).count(),
            2,
            "both placeholders should be filled: {html}"
        );
        assert!(html.starts_with("var $table_json_meta = 1;"));
        assert!(html.ends_with("}]"));
    }

    #[test]
    fn test_render_keeps_dollar_signs_in_urls() {
        let report = Report::select(date(), vec![stats("/price/$1", 1.0)], 10);
        let html = report.render("$table_json").unwrap();
        assert!(html.contains(r#""url":"/price/$1""#));
    }

    #[test]
    fn test_default_template_has_placeholder() {
        assert!(has_placeholder(DEFAULT_TEMPLATE));
        assert!(!has_placeholder("var $table_json_meta;"));
    }

    #[test]
    fn test_url_list() {
        let report = Report::select(date(), vec![stats("/b", 2.0), stats("/a", 1.0)], 10);
        assert_eq!(report.url_list(), "/a\n/b\n");
    }
}
