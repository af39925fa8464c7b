//! CLI argument definitions for the `asdp` client.

use std::path::PathBuf;

use asdp_model::{
    ConfigPatch, DetectionMethod, HandlingMethod, ImputationConfig, ImputationMethod,
    OutlierConfig, ReportFormat, WeightsConfig,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "asdp",
    version,
    about = "ASDP survey processing client - upload, clean, estimate and report",
    long_about = "Drive the ASDP survey processing backend from the command line.\n\n\
                  Uploads a CSV or Excel dataset, runs imputation, outlier handling\n\
                  and weighted estimation, and exports PDF/HTML reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

/// Backend, session and export options shared by all subcommands.
#[derive(Args)]
pub struct ConnectionArgs {
    /// Backend base URL (overrides the settings file and ASDP_BASE_URL).
    #[arg(long = "server", value_name = "URL", global = true)]
    pub server: Option<String>,

    /// Settings file to read instead of the default location.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for exported reports and data.
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Sign in with this user before running the command.
    #[arg(long = "username", env = "ASDP_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for --username.
    #[arg(
        long = "password",
        env = "ASDP_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a dataset and show its summary.
    Inspect(InspectArgs),

    /// Upload, process and export a dataset.
    Run(RunArgs),

    /// Show the signed-in user.
    Whoami,
}

#[derive(Args)]
pub struct InspectArgs {
    /// CSV or Excel file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    /// CSV or Excel file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Missing value imputation method.
    #[arg(long = "imputation", value_enum, default_value = "mean")]
    pub imputation: ImputationArg,

    /// Columns to impute (default: all numeric columns).
    #[arg(long = "impute-columns", value_name = "COLUMNS", value_delimiter = ',')]
    pub impute_columns: Vec<String>,

    /// Outlier detection method.
    #[arg(long = "detection", value_enum, default_value = "iqr")]
    pub detection: DetectionArg,

    /// Outlier handling method.
    #[arg(long = "handling", value_enum, default_value = "winsorize")]
    pub handling: HandlingArg,

    /// Columns checked for outliers (default: all numeric columns).
    #[arg(long = "outlier-columns", value_name = "COLUMNS", value_delimiter = ',')]
    pub outlier_columns: Vec<String>,

    /// Column holding survey weights (default: unweighted).
    #[arg(long = "weight-column", value_name = "COLUMN")]
    pub weight_column: Option<String>,

    /// Columns to estimate (default: all numeric columns).
    #[arg(long = "estimate-columns", value_name = "COLUMNS", value_delimiter = ',')]
    pub estimate_columns: Vec<String>,

    /// Export a report after processing; repeat for several formats.
    #[arg(long = "report", value_enum)]
    pub reports: Vec<ReportArg>,

    /// Download the processed dataset as CSV.
    #[arg(long = "download-data")]
    pub download_data: bool,

    /// Save HTML reports without opening them.
    #[arg(long = "no-open")]
    pub no_open: bool,
}

impl RunArgs {
    /// Configuration update described by the flags.
    #[must_use]
    pub fn config_patch(&self) -> ConfigPatch {
        ConfigPatch {
            imputation: Some(ImputationConfig {
                method: self.imputation.into(),
                columns: self.impute_columns.clone(),
            }),
            outliers: Some(OutlierConfig {
                detection_method: self.detection.into(),
                handling_method: self.handling.into(),
                columns: self.outlier_columns.clone(),
            }),
            weights: Some(WeightsConfig {
                column: self.weight_column.clone(),
            }),
            estimate_columns: Some(self.estimate_columns.clone()),
        }
    }

    /// Every column named on the command line.
    pub fn named_columns(&self) -> impl Iterator<Item = &str> {
        self.impute_columns
            .iter()
            .chain(&self.outlier_columns)
            .chain(&self.estimate_columns)
            .chain(&self.weight_column)
            .map(String::as_str)
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ImputationArg {
    Mean,
    Median,
    Knn,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DetectionArg {
    Iqr,
    Zscore,
    #[value(name = "isolation_forest", alias = "isolation-forest")]
    IsolationForest,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HandlingArg {
    Winsorize,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    Pdf,
    Html,
}

impl From<ImputationArg> for ImputationMethod {
    fn from(arg: ImputationArg) -> Self {
        match arg {
            ImputationArg::Mean => Self::Mean,
            ImputationArg::Median => Self::Median,
            ImputationArg::Knn => Self::Knn,
        }
    }
}

impl From<DetectionArg> for DetectionMethod {
    fn from(arg: DetectionArg) -> Self {
        match arg {
            DetectionArg::Iqr => Self::Iqr,
            DetectionArg::Zscore => Self::Zscore,
            DetectionArg::IsolationForest => Self::IsolationForest,
        }
    }
}

impl From<HandlingArg> for HandlingMethod {
    fn from(arg: HandlingArg) -> Self {
        match arg {
            HandlingArg::Winsorize => Self::Winsorize,
            HandlingArg::Remove => Self::Remove,
        }
    }
}

impl From<ReportArg> for ReportFormat {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Pdf => Self::Pdf,
            ReportArg::Html => Self::Html,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
