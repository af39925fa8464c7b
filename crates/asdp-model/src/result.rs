//! Output of a processing run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point estimate with spread and a 95% confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Mean.
    pub mean: f64,
    /// Standard deviation.
    pub std: f64,
    /// Standard error of the mean.
    pub se: f64,
    /// Lower bound of the 95% confidence interval.
    pub ci_95_lower: f64,
    /// Upper bound of the 95% confidence interval.
    pub ci_95_upper: f64,
}

/// Weighted and unweighted estimates for one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableEstimate {
    /// Estimate using survey weights, when a weight column was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted: Option<Estimate>,
    /// Raw estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unweighted: Option<Estimate>,
}

impl VariableEstimate {
    /// The estimate to display: weighted when available, otherwise unweighted.
    #[must_use]
    pub fn preferred(&self) -> Option<&Estimate> {
        self.weighted.as_ref().or(self.unweighted.as_ref())
    }
}

/// Result of one `/clean` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Ordered log of cleaning steps applied by the backend.
    #[serde(default)]
    pub cleaning_log: Vec<String>,
    /// Estimates keyed by variable name.
    #[serde(default)]
    pub estimates: BTreeMap<String, VariableEstimate>,
    /// Rendered plot markup keyed by plot name.
    #[serde(default)]
    pub plots: BTreeMap<String, String>,
}

impl ProcessingResult {
    /// Whether the run produced any estimates.
    #[must_use]
    pub fn has_estimates(&self) -> bool {
        !self.estimates.is_empty()
    }
}
