//! Upload, configure, process, report workflow.
//!
//! [`WorkflowController`] is a small state machine:
//!
//! ```text
//! Idle -> Uploading -> Summarized -> Processing -> Completed
//!              ^            ^             |            |
//!              |            +-- failure --+            |
//!              +--------------- re-upload -------------+
//! ```
//!
//! Upload and processing share one in-flight slot. Report generation and
//! data download are side-channel exports that leave the state alone.

mod controller;
mod guard;
mod state;

pub use controller::{MAX_UPLOAD_BYTES, SUPPORTED_EXTENSIONS, WorkflowController};
pub use state::{WorkflowStage, WorkflowState};
