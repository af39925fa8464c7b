//! Client for the ASDP survey processing backend.
//!
//! The crate drives the upload, configure, process, report workflow against
//! the backend and keeps local state consistent with it:
//! - [`transport`]: the [`Transport`] seam and its `reqwest` implementation
//! - [`response`]: pure interpretation of backend responses
//! - [`session`]: the signed-in user, injected into the controller
//! - [`notify`]: timed toast notifications
//! - [`export`]: where reports and processed data are written
//! - [`workflow`]: the [`WorkflowController`] state machine
//! - [`settings`]: persisted client settings
//!
//! # Example
//!
//! ```no_run
//! use asdp_client::{ClientSettings, http_controller};
//! use asdp_model::ReportFormat;
//!
//! # async fn run() -> asdp_client::Result<()> {
//! let controller = http_controller(&ClientSettings::load())?;
//! controller.submit_upload("survey.csv").await?;
//! controller.start_processing().await?;
//! controller.generate_report(ReportFormat::Pdf).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod notify;
pub mod response;
pub mod session;
pub mod settings;
pub mod transport;
pub mod workflow;

use std::sync::Arc;

pub use error::{ClientError, Result};
pub use export::{DirectorySink, ExportSink};
pub use notify::{Notifier, TOAST_TTL, Toast, ToastId, ToastKind};
pub use session::{HttpSession, SessionProvider};
pub use settings::{ClientSettings, ExportSettings, ServerSettings};
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport};
pub use workflow::{WorkflowController, WorkflowStage, WorkflowState};

/// Controller wired to the HTTP backend.
pub type HttpController = WorkflowController<HttpTransport, HttpSession<HttpTransport>>;

/// Build a controller talking to the configured backend.
///
/// The session shares the transport, and with it the cookie store.
pub fn http_controller(settings: &ClientSettings) -> Result<HttpController> {
    let transport = Arc::new(HttpTransport::new(&settings.server)?);
    let session = HttpSession::new(Arc::clone(&transport));
    let sink = Arc::new(DirectorySink::from_settings(&settings.export));
    Ok(WorkflowController::new(transport, session, sink))
}
