//! Report export formats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Format requested from the `/report` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Binary PDF document.
    Pdf,
    /// Standalone HTML document delivered inside JSON.
    Html,
}

impl ReportFormat {
    /// Wire name and file extension.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `/report` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Requested format.
    pub format: ReportFormat,
}
