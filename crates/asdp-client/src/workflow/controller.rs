//! The workflow controller.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use asdp_model::{
    CleanRequest, ConfigPatch, DatasetId, DatasetSummary, ProcessingConfig, ProcessingResult,
    ReportFormat, ReportRequest,
};
use chrono::{DateTime, Utc};
use tracing::Instrument;

use super::guard::{InFlight, lock};
use super::state::{WorkflowStage, WorkflowState};
use crate::error::{ClientError, Result};
use crate::export::{ExportSink, processed_data_file_name, report_file_name};
use crate::notify::Notifier;
use crate::response::{
    interpret_clean, interpret_download, interpret_report_html, interpret_report_pdf,
    interpret_upload,
};
use crate::session::SessionProvider;
use crate::transport::{ApiRequest, Transport};

/// Uploads above this size are logged as likely to be rejected.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// File extensions the backend accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

const UPLOAD_SUCCEEDED: &str = "File uploaded successfully";
const PROCESSING_SUCCEEDED: &str = "Processing completed";
const UPLOAD_FAILED: &str = "Upload failed: ";
const PROCESSING_FAILED: &str = "Processing failed: ";
const REPORT_FAILED: &str = "Report failed: ";
const DOWNLOAD_FAILED: &str = "Download failed: ";

/// Drives the upload, configure, process, report workflow.
///
/// The controller exclusively owns the dataset summary, dataset handle,
/// configuration, result and toast queue. Every operation reports its
/// outcome through the [`Notifier`] before returning; the returned `Result`
/// is for programmatic callers.
pub struct WorkflowController<T, S> {
    transport: Arc<T>,
    session: S,
    sink: Arc<dyn ExportSink>,
    notifier: Notifier,
    busy: AtomicBool,
    state: Mutex<WorkflowState>,
    clock: fn() -> DateTime<Utc>,
}

impl<T, S> std::fmt::Debug for WorkflowController<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &*lock(&self.state))
            .field("busy", &self.busy.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<T: Transport, S: SessionProvider> WorkflowController<T, S> {
    /// Creates a controller in the [`WorkflowStage::Idle`] stage.
    pub fn new(transport: Arc<T>, session: S, sink: Arc<dyn ExportSink>) -> Self {
        Self {
            transport,
            session,
            sink,
            notifier: Notifier::new(),
            busy: AtomicBool::new(false),
            state: Mutex::new(WorkflowState::default()),
            clock: Utc::now,
        }
    }

    /// Replace the clock used to timestamp export file names.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    // Accessors

    /// Current stage.
    pub fn stage(&self) -> WorkflowStage {
        lock(&self.state).stage
    }

    /// Summary of the last successful upload.
    pub fn summary(&self) -> Option<DatasetSummary> {
        lock(&self.state).summary.clone()
    }

    /// Handle of the last successful upload.
    pub fn dataset_id(&self) -> Option<DatasetId> {
        lock(&self.state).dataset_id.clone()
    }

    /// Configuration being edited.
    pub fn config(&self) -> ProcessingConfig {
        lock(&self.state).config.clone()
    }

    /// Result of the last successful run.
    pub fn result(&self) -> Option<ProcessingResult> {
        lock(&self.state).result.clone()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> WorkflowState {
        lock(&self.state).clone()
    }

    /// Whether an upload or processing request holds the in-flight slot.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Toast queue the controller reports to.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Injected session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Numeric columns of the held summary, for weight and estimate selectors.
    pub fn numeric_columns(&self) -> Vec<String> {
        lock(&self.state).numeric_columns()
    }

    // Operations

    /// Upload a dataset file from disk.
    pub async fn submit_upload(&self, path: impl AsRef<Path>) -> Result<DatasetSummary> {
        let path = path.as_ref();
        let span = self.span("upload");
        async {
            tracing::info!(file = %path.display(), "Uploading dataset");
            let outcome = match self.acquire_upload() {
                Ok(guard) => match tokio::fs::read(path).await {
                    Ok(bytes) => self.upload(guard, file_name(path), bytes).await,
                    Err(e) => Err(ClientError::Io(format!(
                        "cannot read {}: {e}",
                        path.display()
                    ))),
                },
                Err(e) => Err(e),
            };
            self.settle(UPLOAD_FAILED, outcome).await
        }
        .instrument(span)
        .await
    }

    /// Upload a dataset already held in memory.
    pub async fn submit_upload_bytes(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DatasetSummary> {
        let file_name = file_name.into();
        let span = self.span("upload");
        async {
            tracing::info!(file = %file_name, "Uploading dataset");
            let outcome = match self.acquire_upload() {
                Ok(guard) => self.upload(guard, file_name, bytes).await,
                Err(e) => Err(e),
            };
            self.settle(UPLOAD_FAILED, outcome).await
        }
        .instrument(span)
        .await
    }

    fn acquire_upload(&self) -> Result<InFlight<'_>> {
        InFlight::acquire(&self.state, &self.busy, WorkflowStage::Uploading, |_| {})
            .ok_or(ClientError::Busy)
    }

    async fn upload(
        &self,
        guard: InFlight<'_>,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<DatasetSummary> {
        check_advisory_limits(&file_name, bytes.len());

        let response = self
            .transport
            .send(ApiRequest::Upload { file_name, bytes })
            .await?;
        let outcome = interpret_upload(&response)?;

        tracing::info!(
            rows = outcome.summary.rows,
            columns = outcome.summary.columns,
            dataset_id = ?outcome.dataset_id,
            "Dataset summarized"
        );
        let summary = outcome.summary.clone();
        guard.commit(WorkflowStage::Summarized, |state| {
            state.summary = Some(outcome.summary);
            state.dataset_id = outcome.dataset_id;
        });
        self.notifier.success(UPLOAD_SUCCEEDED);
        Ok(summary)
    }

    /// Merge a partial update into the configuration.
    ///
    /// Only allowed while a dataset summary is held and no request is in
    /// flight. This is a local edit and emits no toast.
    pub fn update_config(&self, patch: ConfigPatch) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.stage.can_configure() {
            tracing::warn!(stage = %state.stage, "Configuration edit rejected");
            return Err(if state.stage.is_in_flight() {
                ClientError::Busy
            } else {
                ClientError::NoDataset
            });
        }
        state.config.apply(patch);
        tracing::debug!(config = ?state.config, "Configuration updated");
        Ok(())
    }

    /// Submit the current configuration for processing.
    ///
    /// The previous result is cleared before the request is sent. On failure
    /// the result stays absent and the stage returns to
    /// [`WorkflowStage::Summarized`].
    pub async fn start_processing(&self) -> Result<ProcessingResult> {
        let span = self.span("process");
        async {
            let outcome = self.process().await;
            self.settle(PROCESSING_FAILED, outcome).await
        }
        .instrument(span)
        .await
    }

    async fn process(&self) -> Result<ProcessingResult> {
        if self.is_busy() {
            return Err(ClientError::Busy);
        }
        if !self.stage().can_configure() {
            return Err(ClientError::NoDataset);
        }

        let mut request = None;
        let mut guard = InFlight::acquire(
            &self.state,
            &self.busy,
            WorkflowStage::Processing,
            |state| {
                state.result = None;
                request = Some(CleanRequest::new(&state.config, state.dataset_id.clone()));
            },
        )
        .ok_or(ClientError::Busy)?;
        guard.fall_back_to(WorkflowStage::Summarized);
        let request = request.ok_or(ClientError::NoDataset)?;

        tracing::info!(dataset_id = ?request.dataset_id, "Processing dataset");
        let response = self.transport.send(ApiRequest::Clean(request)).await?;
        let result = interpret_clean(&response)?;

        tracing::info!(
            log_entries = result.cleaning_log.len(),
            estimates = result.estimates.len(),
            plots = result.plots.len(),
            "Processing finished"
        );
        let returned = result.clone();
        guard.commit(WorkflowStage::Completed, |state| {
            state.result = Some(result);
        });
        self.notifier.success(PROCESSING_SUCCEEDED);
        Ok(returned)
    }

    /// Request a report and export it.
    ///
    /// PDF reports are saved as a file; HTML reports are saved and opened as
    /// a standalone document. The workflow state is not touched.
    pub async fn generate_report(&self, format: ReportFormat) -> Result<PathBuf> {
        let span = self.span("report");
        async {
            let outcome = self.report(format).await;
            self.settle(REPORT_FAILED, outcome).await
        }
        .instrument(span)
        .await
    }

    async fn report(&self, format: ReportFormat) -> Result<PathBuf> {
        tracing::info!(%format, "Requesting report");
        let response = self
            .transport
            .send(ApiRequest::Report(ReportRequest { format }))
            .await?;

        let file_name = report_file_name(format, (self.clock)());
        let path = match format {
            ReportFormat::Pdf => {
                let bytes = interpret_report_pdf(&response)?;
                self.export(move |sink| sink.save(&file_name, &bytes)).await?
            }
            ReportFormat::Html => {
                let html = interpret_report_html(&response)?;
                self.export(move |sink| sink.open_document(&file_name, &html))
                    .await?
            }
        };

        self.notifier
            .success(format!("Report saved to {}", path.display()));
        Ok(path)
    }

    /// Download the processed dataset as CSV and save it.
    pub async fn download_processed_data(&self) -> Result<PathBuf> {
        let span = self.span("download");
        async {
            let outcome = self.download().await;
            self.settle(DOWNLOAD_FAILED, outcome).await
        }
        .instrument(span)
        .await
    }

    async fn download(&self) -> Result<PathBuf> {
        tracing::info!("Downloading processed data");
        let response = self.transport.send(ApiRequest::DownloadData).await?;
        let bytes = interpret_download(&response)?;

        let file_name = processed_data_file_name((self.clock)());
        let path = self
            .export(move |sink| sink.save(&file_name, &bytes))
            .await?;

        self.notifier
            .success(format!("Processed data saved to {}", path.display()));
        Ok(path)
    }

    // Helpers

    fn span(&self, operation: &'static str) -> tracing::Span {
        let user = self.session.current_user().map(|user| user.username);
        tracing::info_span!(
            "workflow",
            operation,
            user = user.as_deref().unwrap_or("anonymous")
        )
    }

    async fn export(
        &self,
        write: impl FnOnce(&dyn ExportSink) -> Result<PathBuf> + Send + 'static,
    ) -> Result<PathBuf> {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || write(sink.as_ref()))
            .await
            .map_err(|e| ClientError::Io(format!("export task failed: {e}")))?
    }

    /// Surface a failure: log it, resync the session on 401 and emit the
    /// error toast.
    async fn settle<V>(&self, prefix: &str, outcome: Result<V>) -> Result<V> {
        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        tracing::warn!(error = %err, "{}", prefix.trim_end_matches([':', ' ']));
        if err.is_unauthorized() {
            self.session.refresh().await;
        }
        self.notifier
            .error(format!("{prefix}{}", err.user_message()));
        Err(err)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_advisory_limits(file_name: &str, size: usize) {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    if !extension
        .as_deref()
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
    {
        tracing::warn!(file = file_name, "File type is not CSV or Excel; the server may reject it");
    }
    if size > MAX_UPLOAD_BYTES {
        tracing::warn!(
            file = file_name,
            size,
            limit = MAX_UPLOAD_BYTES,
            "File exceeds the upload size limit; the server may reject it"
        );
    }
}
