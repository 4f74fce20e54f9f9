use crate::{Error, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_SIZE: usize = 1000;
pub const DEFAULT_REPORT_DIR: &str = "./reports";
pub const DEFAULT_LOG_DIR: &str = "./log";

const REPORT_SIZE: &str = "REPORT_SIZE";
const REPORT_DIR: &str = "REPORT_DIR";
const LOG_DIR: &str = "LOG_DIR";
const LOGGING_FILE: &str = "LOGGING_FILE";
const REPORT_TEMPLATE: &str = "REPORT_TEMPLATE";

/// Key/value pairs read from an external YAML config file
pub type ExternalConfig = BTreeMap<String, Value>;

/// Settings for one analyzer run
///
/// Built once at startup and passed by reference; never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of URLs in a report
    pub report_size: usize,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Log to this file instead of stderr
    pub logging_file: Option<PathBuf>,
    /// Custom HTML template; the built-in one is used when unset
    pub report_template: Option<PathBuf>,
    /// Keys this tool does not know, carried through unchanged
    pub extra: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_size: DEFAULT_REPORT_SIZE,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            logging_file: None,
            report_template: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Defaults overridden by the YAML file at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let external = load_external(path)?;
        Ok(Self::merge(&Self::default(), &external))
    }

    /// Combine `base` with external values, key by key
    ///
    /// Values that cannot be used for a known key keep the value from `base`
    /// and are logged as warnings.
    pub fn merge(base: &Config, external: &ExternalConfig) -> Config {
        let (merged, rejected) = Self::merge_checked(base, external);
        for value in &rejected {
            tracing::warn!("{}", value);
        }
        merged
    }

    /// Like [`Config::merge`], but hands back the rejected values instead of
    /// logging them
    pub fn merge_checked(
        base: &Config,
        external: &ExternalConfig,
    ) -> (Config, Vec<RejectedValue>) {
        let mut merged = base.clone();
        let mut rejected = Vec::new();

        for (key, value) in external {
            match key.as_str() {
                REPORT_SIZE => match parse_report_size(value) {
                    Some(size) => merged.report_size = size,
                    None => rejected.push(RejectedValue::new(key, value, base.report_size)),
                },
                REPORT_DIR => {
                    if let Err(r) = merge_path(&mut merged.report_dir, key, value) {
                        rejected.push(r);
                    }
                }
                LOG_DIR => {
                    if let Err(r) = merge_path(&mut merged.log_dir, key, value) {
                        rejected.push(r);
                    }
                }
                LOGGING_FILE => merged.logging_file = value_as_string(value).map(PathBuf::from),
                REPORT_TEMPLATE => {
                    merged.report_template = value_as_string(value).map(PathBuf::from)
                }
                _ => {
                    merged.extra.insert(key.clone(), value.clone());
                }
            }
        }

        (merged, rejected)
    }
}

/// A config value that was ignored in favour of the base value
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedValue {
    pub key: String,
    pub value: Value,
    pub kept: String,
}

impl RejectedValue {
    fn new(key: &str, value: &Value, kept: impl fmt::Display) -> Self {
        Self {
            key: key.to_string(),
            value: value.clone(),
            kept: kept.to_string(),
        }
    }
}

impl fmt::Display for RejectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ignoring invalid {} {:?}, using {}",
            self.key, self.value, self.kept
        )
    }
}

/// Read the YAML mapping at `path`
pub fn load_external(path: &Path) -> Result<ExternalConfig> {
    tracing::debug!("Reading config file from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read config file {}: {}", path.display(), e))
    })?;

    if content.trim().is_empty() {
        return Ok(ExternalConfig::new());
    }

    let mapping = match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(ExternalConfig::new()),
        other => {
            return Err(Error::Config(format!(
                "config file {} must contain a mapping, found {:?}",
                path.display(),
                other
            )));
        }
    };

    let mut external = ExternalConfig::new();
    for (key, value) in mapping {
        match value_as_string(&key) {
            Some(key) => {
                external.insert(key, value);
            }
            None => tracing::warn!("Ignoring config entry with non-scalar key {:?}", key),
        }
    }

    tracing::info!("Loaded {} config values from {}", external.len(), path.display());
    Ok(external)
}

fn parse_report_size(value: &Value) -> Option<usize> {
    let size = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    size.filter(|&size| size > 0)
}

fn merge_path(
    target: &mut PathBuf,
    key: &str,
    value: &Value,
) -> std::result::Result<(), RejectedValue> {
    match value_as_string(value) {
        Some(path) if !path.is_empty() => {
            *target = PathBuf::from(path);
            Ok(())
        }
        _ => Err(RejectedValue::new(key, value, target.display())),
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn external(yaml: &str) -> ExternalConfig {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, yaml).unwrap();
        load_external(&path).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.report_size, 1000);
        assert_eq!(config.report_dir, PathBuf::from("./reports"));
        assert_eq!(config.log_dir, PathBuf::from("./log"));
        assert_eq!(config.logging_file, None);
    }

    #[test]
    fn test_merge_overrides_key_by_key() {
        let merged = Config::merge(&Config::default(), &external("REPORT_SIZE: 1500\n"));

        assert_eq!(merged.report_size, 1500);
        assert_eq!(merged.report_dir, PathBuf::from("./reports"));
        assert_eq!(merged.log_dir, PathBuf::from("./log"));
    }

    #[test]
    fn test_merge_all_keys() {
        let merged = Config::merge(
            &Config::default(),
            &external(
                "REPORT_SIZE: '2000'\nREPORT_DIR: /tmp/reports\nLOG_DIR: /var/log/nginx\n\
                 LOGGING_FILE: /tmp/analyzer.log\nREPORT_TEMPLATE: ./report.html\n",
            ),
        );

        assert_eq!(merged.report_size, 2000);
        assert_eq!(merged.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(merged.log_dir, PathBuf::from("/var/log/nginx"));
        assert_eq!(merged.logging_file, Some(PathBuf::from("/tmp/analyzer.log")));
        assert_eq!(merged.report_template, Some(PathBuf::from("./report.html")));
        assert!(merged.extra.is_empty());
    }

    #[test]
    fn test_merge_invalid_report_size_falls_back() {
        let defaults = Config::default();

        let merged = Config::merge(&defaults, &external("REPORT_SIZE: lots\n"));
        assert_eq!(merged.report_size, DEFAULT_REPORT_SIZE);

        let merged = Config::merge(&defaults, &external("REPORT_SIZE: 0\n"));
        assert_eq!(merged.report_size, DEFAULT_REPORT_SIZE);

        let merged = Config::merge(&defaults, &external("REPORT_SIZE: -5\n"));
        assert_eq!(merged.report_size, DEFAULT_REPORT_SIZE);
    }

    #[test]
    fn test_merge_checked_reports_rejected_values() {
        let (merged, rejected) = Config::merge_checked(
            &Config::default(),
            &external("REPORT_SIZE: lots\nLOG_DIR: ''\nREPORT_DIR: /tmp/reports\n"),
        );

        assert_eq!(merged.report_size, DEFAULT_REPORT_SIZE);
        assert_eq!(merged.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(merged.report_dir, PathBuf::from("/tmp/reports"));

        let keys: Vec<&str> = rejected.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["LOG_DIR", "REPORT_SIZE"]);
        assert_eq!(
            rejected[1].to_string(),
            r#"Ignoring invalid REPORT_SIZE String("lots"), using 1000"#
        );
    }

    #[test]
    fn test_merge_keeps_unknown_keys() {
        let merged = Config::merge(
            &Config::default(),
            &external("REPORT_SIZE: 10\nRETENTION_DAYS: 7\n"),
        );

        assert_eq!(merged.report_size, 10);
        assert_eq!(
            merged.extra.get("RETENTION_DAYS"),
            Some(&Value::Number(7.into()))
        );
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let defaults = Config::default();
        let values = external("REPORT_SIZE: 5\nLOG_DIR: ./other\n");

        let merged = Config::merge(&defaults, &values);

        assert_eq!(defaults, Config::default());
        assert_eq!(values.len(), 2);
        assert_ne!(merged, defaults);
    }

    #[test]
    fn test_load_empty_file() {
        assert!(external("").is_empty());
        assert!(external("  \n\n").is_empty());
    }

    #[test]
    fn test_load_non_mapping_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "- a\n- b\n").unwrap();

        assert!(matches!(load_external(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::from_file(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
