use super::{DEFAULT_TEMPLATE, Report, TEMPLATE_PLACEHOLDER, has_placeholder};
use crate::log::report_file_name;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes rendered reports into a report directory
pub struct ReportWriter {
    report_dir: PathBuf,
    template: String,
}

impl ReportWriter {
    /// Writer using the built-in template
    pub fn new(report_dir: &Path) -> Self {
        Self {
            report_dir: report_dir.to_path_buf(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Writer using a custom template string
    pub fn with_template(report_dir: &Path, template: String) -> Result<Self> {
        if !has_placeholder(&template) {
            return Err(Error::Template(format!(
                "template has no {} placeholder",
                TEMPLATE_PLACEHOLDER
            )));
        }

        Ok(Self {
            report_dir: report_dir.to_path_buf(),
            template,
        })
    }

    /// Writer using the template file at `template_path`
    pub fn with_template_file(report_dir: &Path, template_path: &Path) -> Result<Self> {
        tracing::debug!("Loading report template from: {}", template_path.display());
        let template = fs::read_to_string(template_path)?;
        Self::with_template(report_dir, template)
    }

    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.report_dir.join(report_file_name(date))
    }

    pub fn url_list_path(&self, date: NaiveDate) -> PathBuf {
        self.report_dir
            .join(format!("top-urls-{}.txt", date.format("%Y%m%d")))
    }

    /// Write the URL list and the HTML report for `report`
    ///
    /// The HTML report is moved into place last, so its presence means the
    /// run for that date completed.
    pub fn write(&self, report: &Report) -> Result<PathBuf> {
        let html = report.render(&self.template)?;

        let list_path = self.url_list_path(report.date);
        atomic_write(&list_path, report.url_list().as_bytes())?;
        tracing::debug!("Wrote URL list to {}", list_path.display());

        let path = self.report_path(report.date);
        atomic_write(&path, html.as_bytes())?;

        tracing::info!(
            "Successfully wrote report with {} URLs to {}",
            report.rows.len(),
            path.display()
        );

        Ok(path)
    }
}

/// Write `contents` to a temporary file next to `path`, then rename it over
/// `path`
fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
