//! Processing configuration: editing state and the submitted request.
//!
//! The editing state keeps column selections as plain lists where an empty
//! list means "all numeric columns". Normalization of empty selections to
//! `null` happens only when a request is built, see
//! [`ProcessingConfig::to_submission`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetId;

/// Missing value imputation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    /// Column mean.
    #[default]
    Mean,
    /// Column median.
    Median,
    /// K-nearest neighbours.
    Knn,
}

impl ImputationMethod {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Knn => "K-Nearest Neighbors (KNN)",
        }
    }
}

/// Outlier detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Interquartile range fences.
    #[default]
    Iqr,
    /// Standard score threshold.
    Zscore,
    /// Isolation forest model.
    IsolationForest,
}

impl DetectionMethod {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Iqr => "Interquartile Range (IQR)",
            Self::Zscore => "Z-Score",
            Self::IsolationForest => "Isolation Forest",
        }
    }
}

/// What to do with detected outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlingMethod {
    /// Clip to percentile bounds.
    #[default]
    Winsorize,
    /// Drop the affected records.
    Remove,
}

impl HandlingMethod {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Winsorize => "Winsorization",
            Self::Remove => "Remove Outliers",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    )*};
}

display_via_label!(ImputationMethod, DetectionMethod, HandlingMethod);

/// Imputation section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Imputation strategy.
    pub method: ImputationMethod,
    /// Target columns; empty means all numeric columns.
    pub columns: Vec<String>,
}

/// Outlier section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Detection strategy.
    pub detection_method: DetectionMethod,
    /// Handling strategy.
    pub handling_method: HandlingMethod,
    /// Target columns; empty means all numeric columns.
    pub columns: Vec<String>,
}

/// Survey weight section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Column holding per-record weights; `None` means unweighted.
    pub column: Option<String>,
}

/// Configuration edited by the user before a processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Missing value imputation.
    pub imputation: ImputationConfig,
    /// Outlier detection and handling.
    pub outliers: OutlierConfig,
    /// Survey weights.
    pub weights: WeightsConfig,
    /// Columns to estimate; empty means all numeric columns.
    pub estimate_columns: Vec<String>,
}

/// Partial update of a [`ProcessingConfig`].
///
/// Each present section replaces the corresponding section wholesale;
/// absent sections are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// Replacement imputation section.
    pub imputation: Option<ImputationConfig>,
    /// Replacement outlier section.
    pub outliers: Option<OutlierConfig>,
    /// Replacement weights section.
    pub weights: Option<WeightsConfig>,
    /// Replacement estimate column selection.
    pub estimate_columns: Option<Vec<String>>,
}

impl ConfigPatch {
    /// Patch replacing only the imputation section.
    #[must_use]
    pub fn imputation(section: ImputationConfig) -> Self {
        Self {
            imputation: Some(section),
            ..Default::default()
        }
    }

    /// Patch replacing only the outlier section.
    #[must_use]
    pub fn outliers(section: OutlierConfig) -> Self {
        Self {
            outliers: Some(section),
            ..Default::default()
        }
    }

    /// Patch replacing only the weights section.
    #[must_use]
    pub fn weights(section: WeightsConfig) -> Self {
        Self {
            weights: Some(section),
            ..Default::default()
        }
    }

    /// Patch replacing only the estimate column selection.
    #[must_use]
    pub fn estimate_columns(columns: Vec<String>) -> Self {
        Self {
            estimate_columns: Some(columns),
            ..Default::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imputation.is_none()
            && self.outliers.is_none()
            && self.weights.is_none()
            && self.estimate_columns.is_none()
    }
}

impl ProcessingConfig {
    /// Merge a patch into this configuration.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(imputation) = patch.imputation {
            self.imputation = imputation;
        }
        if let Some(outliers) = patch.outliers {
            self.outliers = outliers;
        }
        if let Some(weights) = patch.weights {
            self.weights = weights;
        }
        if let Some(columns) = patch.estimate_columns {
            self.estimate_columns = columns;
        }
    }

    /// Build the configuration as it is sent to the backend.
    ///
    /// Empty column selections become `None` (serialized as `null`, meaning
    /// all numeric columns); a blank weight column becomes `None`.
    #[must_use]
    pub fn to_submission(&self) -> SubmittedConfig {
        SubmittedConfig {
            imputation: SubmittedImputation {
                method: self.imputation.method,
                columns: non_empty(&self.imputation.columns),
            },
            outliers: SubmittedOutliers {
                detection_method: self.outliers.detection_method,
                handling_method: self.outliers.handling_method,
                columns: non_empty(&self.outliers.columns),
            },
            weights: SubmittedWeights {
                column: self
                    .weights
                    .column
                    .as_deref()
                    .filter(|column| !column.trim().is_empty())
                    .map(str::to_string),
            },
            estimate_columns: non_empty(&self.estimate_columns),
        }
    }
}

fn non_empty(columns: &[String]) -> Option<Vec<String>> {
    if columns.is_empty() {
        None
    } else {
        Some(columns.to_vec())
    }
}

/// Imputation section of a submitted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedImputation {
    /// Imputation strategy.
    pub method: ImputationMethod,
    /// Target columns, `None` for all numeric columns.
    pub columns: Option<Vec<String>>,
}

/// Outlier section of a submitted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedOutliers {
    /// Detection strategy.
    pub detection_method: DetectionMethod,
    /// Handling strategy.
    pub handling_method: HandlingMethod,
    /// Target columns, `None` for all numeric columns.
    pub columns: Option<Vec<String>>,
}

/// Weights section of a submitted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedWeights {
    /// Weight column, `None` for unweighted estimation.
    pub column: Option<String>,
}

/// Normalized configuration as sent in a `/clean` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedConfig {
    /// Imputation section.
    pub imputation: SubmittedImputation,
    /// Outlier section.
    pub outliers: SubmittedOutliers,
    /// Weights section.
    pub weights: SubmittedWeights,
    /// Estimate columns, `None` for all numeric columns.
    pub estimate_columns: Option<Vec<String>>,
}

/// Body of a `/clean` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanRequest {
    /// Normalized processing configuration.
    pub config: SubmittedConfig,
    /// Dataset to process; omitted to let the backend use the session's
    /// most recent upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<DatasetId>,
}

impl CleanRequest {
    /// Build a request from the editing state and an optional dataset handle.
    #[must_use]
    pub fn new(config: &ProcessingConfig, dataset_id: Option<DatasetId>) -> Self {
        Self {
            config: config.to_submission(),
            dataset_id,
        }
    }
}
