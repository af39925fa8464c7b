//! Observable workflow state.

use std::fmt;

use asdp_model::{DatasetId, DatasetSummary, ProcessingConfig, ProcessingResult};

/// Stage of the upload, configure, process, report workflow.
///
/// Configuring is not a stage of its own; it is available while
/// [`WorkflowStage::can_configure`] holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    /// Nothing uploaded yet.
    #[default]
    Idle,
    /// An upload is in flight.
    Uploading,
    /// A dataset summary is held and no result is being shown.
    Summarized,
    /// A processing request is in flight.
    Processing,
    /// The latest processing run succeeded.
    Completed,
}

impl WorkflowStage {
    /// Whether the configuration may be edited and processing started.
    #[must_use]
    pub const fn can_configure(self) -> bool {
        matches!(self, Self::Summarized | Self::Completed)
    }

    /// Whether a request owned by the in-flight guard is running.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Uploading | Self::Processing)
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Uploading => "Uploading",
            Self::Summarized => "Summarized",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the controller owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    /// Current stage.
    pub stage: WorkflowStage,
    /// Summary of the last successful upload.
    pub summary: Option<DatasetSummary>,
    /// Handle of the last successful upload.
    pub dataset_id: Option<DatasetId>,
    /// Configuration being edited.
    pub config: ProcessingConfig,
    /// Result of the last successful run; absent while a run is in flight.
    pub result: Option<ProcessingResult>,
}

impl WorkflowState {
    /// Numeric columns of the held summary; empty without one.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        asdp_model::numeric_columns(self.summary.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_affordance() {
        assert!(!WorkflowStage::Idle.can_configure());
        assert!(!WorkflowStage::Uploading.can_configure());
        assert!(WorkflowStage::Summarized.can_configure());
        assert!(!WorkflowStage::Processing.can_configure());
        assert!(WorkflowStage::Completed.can_configure());
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = WorkflowState::default();
        assert_eq!(state.stage, WorkflowStage::Idle);
        assert!(state.numeric_columns().is_empty());
        assert!(state.result.is_none());
    }
}
