//! Data model for the ASDP survey processing client.
//!
//! These types mirror the JSON exchanged with the processing backend:
//! - [`dataset`]: the summary returned by an upload and the dataset handle
//! - [`config`]: the processing configuration edited before a run
//! - [`result`]: cleaning log, estimates and plots returned by a run
//! - [`report`]: report export formats
//! - [`user`]: the authenticated user as reported by the session endpoints
//!
//! The crate performs no I/O. Everything here is plain serde data plus the
//! small amount of pure logic the workflow needs (numeric column
//! derivation, selection normalization, summary validation).

pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod result;
pub mod user;

pub use config::{
    CleanRequest, ConfigPatch, DetectionMethod, HandlingMethod, ImputationConfig,
    ImputationMethod, OutlierConfig, ProcessingConfig, SubmittedConfig, SubmittedImputation,
    SubmittedOutliers, SubmittedWeights, WeightsConfig,
};
pub use dataset::{DatasetId, DatasetSummary, MissingValue, is_numeric_type, numeric_columns};
pub use error::{ModelError, Result};
pub use report::{ReportFormat, ReportRequest};
pub use result::{Estimate, ProcessingResult, VariableEstimate};
pub use user::{Credentials, ProfileResponse, SessionStatus, User};
