use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

// nginx `ui_short` format:
// $remote_addr $remote_user $http_x_real_ip [$time_local] "$request" $status
// $body_bytes_sent "$http_referer" "$http_user_agent" "$http_x_forwarded_for"
// "$http_X_REQUEST_ID" "$http_X_RB_USER" $request_time
lazy_static! {
    static ref URL_PATTERN: Regex = Regex::new(r"(?i)(?:PUT|GET|POST|HEAD) (.*) http").unwrap();
    static ref LATENCY_PATTERN: Regex = Regex::new(r"(?:[0-9]*\.)?[0-9]+$").unwrap();
}

/// Fields extracted from a single access log line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub url: Option<String>,
    pub latency: Option<f64>,
}

impl RawRecord {
    /// Both fields, if the line was fully parsed
    pub fn into_parts(self) -> Option<(String, f64)> {
        Some((self.url?, self.latency?))
    }
}

/// Decode a raw log line into text
///
/// Invalid UTF-8 falls back to Latin-1, which maps every byte to a char, so
/// decoding never fails. The trailing line ending is dropped.
pub fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(line) => Cow::Borrowed(line),
        Err(e) => {
            tracing::debug!("Line is not valid UTF-8 ({}), decoding as Latin-1", e);
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Extract the request URL and request time from a decoded line
pub fn parse_line(line: &str) -> RawRecord {
    RawRecord {
        url: parse_url(line),
        latency: parse_latency(line),
    }
}

fn parse_url(line: &str) -> Option<String> {
    URL_PATTERN
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn parse_latency(line: &str) -> Option<f64> {
    LATENCY_PATTERN
        .find(line)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
