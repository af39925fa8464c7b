//! Saving exported reports and datasets.

use std::path::{Path, PathBuf};

use asdp_model::ReportFormat;
use chrono::{DateTime, Utc};

use crate::error::{ClientError, Result};
use crate::settings::ExportSettings;

/// Timestamp used in export file names.
///
/// ISO-8601 truncated to seconds with colons replaced by hyphens,
/// e.g. `2026-10-19T08-05-09`.
#[must_use]
pub fn export_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// File name for a report, e.g. `survey_report_2026-10-19T08-05-09.pdf`.
#[must_use]
pub fn report_file_name(format: ReportFormat, at: DateTime<Utc>) -> String {
    format!("survey_report_{}.{}", export_timestamp(at), format.as_str())
}

/// File name for the processed dataset, e.g. `processed_data_2026-10-19T08-05-09.csv`.
#[must_use]
pub fn processed_data_file_name(at: DateTime<Utc>) -> String {
    format!("processed_data_{}.csv", export_timestamp(at))
}

/// Destination for exported files.
pub trait ExportSink: Send + Sync {
    /// Save a binary payload under the given file name.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Save a standalone HTML document and present it to the user.
    fn open_document(&self, file_name: &str, html: &str) -> Result<PathBuf>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    open_documents: bool,
}

impl DirectorySink {
    /// Sink writing into `dir`; HTML documents are not opened.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open_documents: false,
        }
    }

    /// Sink configured from export settings.
    #[must_use]
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self::new(settings.output_dir()).with_open_documents(settings.open_html_reports)
    }

    /// Open HTML documents with the system viewer after saving.
    #[must_use]
    pub fn with_open_documents(mut self, enable: bool) -> Self {
        self.open_documents = enable;
        self
    }

    /// Directory exports are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ClientError::Io(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        let path = available_path(&self.dir, file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| ClientError::Io(format!("cannot write {}: {e}", path.display())))?;
        tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn open_document(&self, file_name: &str, html: &str) -> Result<PathBuf> {
        let path = self.save(file_name, html.as_bytes())?;
        if self.open_documents {
            open::that(&path)
                .map_err(|e| ClientError::Io(format!("cannot open {}: {e}", path.display())))?;
        }
        Ok(path)
    }
}

/// First free path for `file_name` in `dir`.
///
/// Exports are named to the second, so a name already taken gets a
/// ` (1)`, ` (2)`, ... suffix before the extension.
fn available_path(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    if !path.exists() {
        return path;
    }
    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned());
    let extension = name
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem} ({n}){extension}"));
        if !candidate.exists() {
            tracing::info!(
                requested = file_name,
                "{} exists, saving as {}",
                path.display(),
                candidate.display()
            );
            return candidate;
        }
        n += 1;
    }
}
