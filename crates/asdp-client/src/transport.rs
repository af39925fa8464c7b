//! Transport seam between the workflow and the backend.
//!
//! [`Transport`] sends one [`ApiRequest`] and hands back the raw status,
//! content type and body. Interpreting that response is pure code in
//! [`crate::response`], so the HTTP implementation and test doubles share
//! one set of rules.

use std::fmt;
use std::future::Future;

use asdp_model::{CleanRequest, Credentials, ReportRequest};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};

use crate::error::{ClientError, Result};
use crate::settings::ServerSettings;

/// User agent string for backend requests.
const USER_AGENT_VALUE: &str = concat!("asdp-client/", env!("CARGO_PKG_VERSION"));

/// A request to one of the backend endpoints.
#[derive(Clone)]
pub enum ApiRequest {
    /// `POST /upload` with a multipart `file` field.
    Upload {
        /// File name reported to the backend.
        file_name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
    /// `POST /clean` with a JSON body.
    Clean(CleanRequest),
    /// `POST /report` with a JSON body.
    Report(ReportRequest),
    /// `POST /download_data`.
    DownloadData,
    /// `GET /me`.
    Me,
    /// `POST /login` with a JSON body.
    Login(Credentials),
    /// `GET /logout`.
    Logout,
    /// `GET /profile`.
    Profile,
}

impl ApiRequest {
    /// Endpoint path relative to the base URL.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "/upload",
            Self::Clean(_) => "/clean",
            Self::Report(_) => "/report",
            Self::DownloadData => "/download_data",
            Self::Me => "/me",
            Self::Login(_) => "/login",
            Self::Logout => "/logout",
            Self::Profile => "/profile",
        }
    }

    /// HTTP method used for the endpoint.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Me | Self::Logout | Self::Profile => "GET",
            _ => "POST",
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload { file_name, bytes } => f
                .debug_struct("Upload")
                .field("file_name", file_name)
                .field("bytes", &bytes.len())
                .finish(),
            Self::Clean(body) => f.debug_tuple("Clean").field(body).finish(),
            Self::Report(body) => f.debug_tuple("Report").field(body).finish(),
            Self::Login(credentials) => f
                .debug_struct("Login")
                .field("username", &credentials.username)
                .finish_non_exhaustive(),
            Self::DownloadData => f.write_str("DownloadData"),
            Self::Me => f.write_str("Me"),
            Self::Logout => f.write_str("Logout"),
            Self::Profile => f.write_str("Profile"),
        }
    }
}

/// Status, content type and body of a backend response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Response with a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        }
    }

    /// Response with an arbitrary body and content type.
    #[must_use]
    pub fn with_body(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the content type contains the given marker.
    #[must_use]
    pub fn content_type_contains(&self, marker: &str) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|value| value.contains(marker))
    }
}

/// Sends requests to the backend.
///
/// Implementations carry session credentials implicitly; callers never
/// handle tokens. A returned `Err` means no response was received.
pub trait Transport: Send + Sync {
    /// Send a request and collect the full response.
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// HTTP transport backed by `reqwest` with a cookie store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the configured server.
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let url = self.url(request.path());
        tracing::debug!("{} {}", request.method(), url);

        let builder = match request {
            ApiRequest::Upload { file_name, bytes } => {
                let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
                self.client.post(&url).multipart(form)
            }
            ApiRequest::Clean(body) => self.client.post(&url).json(&body),
            ApiRequest::Report(body) => self.client.post(&url).json(&body),
            ApiRequest::DownloadData => self.client.post(&url),
            ApiRequest::Login(credentials) => self
                .client
                .post(&url)
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .json(&credentials),
            ApiRequest::Me | ApiRequest::Logout | ApiRequest::Profile => self.client.get(&url),
        };

        let response = builder
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, bytes = body.len(), "response from {}", url);

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
