//! Interpretation of backend responses.
//!
//! Every failure is reduced to one message by [`failure_message`]:
//! 1. the `error` field of a JSON body,
//! 2. otherwise the raw body text when the body is not JSON,
//! 3. otherwise `HTTP <status>`.
//!
//! A JSON body without an `error` field falls through to the status message,
//! never to the serialized JSON.

use asdp_model::{DatasetId, DatasetSummary, ProcessingResult, ProfileResponse, SessionStatus, User};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::transport::RawResponse;

/// Content type marker required for PDF reports.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Derive the human-readable failure message for a response.
#[must_use]
pub fn failure_message(response: &RawResponse) -> String {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => error_field(&value).unwrap_or_else(|| status_message(response.status)),
        Err(_) => {
            let text = response.text();
            let text = text.trim();
            if text.is_empty() {
                status_message(response.status)
            } else {
                text.to_string()
            }
        }
    }
}

fn status_message(status: u16) -> String {
    format!("HTTP {status}")
}

/// Non-empty `error` field of a JSON object.
fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn http_error(response: &RawResponse) -> ClientError {
    ClientError::Http {
        status: response.status,
        message: failure_message(response),
    }
}

fn ensure_success(response: &RawResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(http_error(response))
    }
}

/// Parse a JSON body; a body that is not JSON is a content failure whose
/// message is the raw text.
fn parse_json(response: &RawResponse, expected: &'static str) -> Result<Value> {
    serde_json::from_slice(&response.body).map_err(|_| ClientError::UnexpectedContent {
        expected,
        message: failure_message(response),
    })
}

/// Successful upload: the new summary and the dataset handle, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Summary of the uploaded dataset.
    pub summary: DatasetSummary,
    /// Handle to thread into the next processing request.
    pub dataset_id: Option<DatasetId>,
}

#[derive(Deserialize)]
struct UploadEnvelope {
    summary: Option<DatasetSummary>,
    #[serde(default)]
    dataset_id: Option<DatasetId>,
}

/// Interpret a `/upload` response.
///
/// Success requires a 2xx status and `success: true`. A body that is not
/// JSON is treated as an error message rather than a parse failure.
pub fn interpret_upload(response: &RawResponse) -> Result<UploadOutcome> {
    ensure_success(response)?;

    let Ok(value) = serde_json::from_slice::<Value>(&response.body) else {
        return Err(ClientError::Application {
            message: failure_message(response),
        });
    };

    if !value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(ClientError::Application {
            message: failure_message(response),
        });
    }

    let envelope: UploadEnvelope =
        serde_json::from_value(value).map_err(|e| ClientError::UnexpectedContent {
            expected: "dataset summary",
            message: format!("malformed upload response: {e}"),
        })?;

    let summary = envelope
        .summary
        .ok_or_else(|| ClientError::UnexpectedContent {
            expected: "dataset summary",
            message: "upload response did not include a dataset summary".to_string(),
        })?;
    summary.validate()?;

    Ok(UploadOutcome {
        summary,
        dataset_id: envelope.dataset_id,
    })
}

/// Interpret a `/clean` response.
pub fn interpret_clean(response: &RawResponse) -> Result<ProcessingResult> {
    ensure_success(response)?;
    let value = parse_json(response, "processing result")?;

    if let Some(message) = error_field(&value) {
        return Err(ClientError::Application { message });
    }

    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedContent {
        expected: "processing result",
        message: format!("malformed processing result: {e}"),
    })
}

/// Interpret a PDF `/report` response, returning the document bytes.
///
/// A 2xx response without a PDF content type is a failure, never an empty
/// download.
pub fn interpret_report_pdf(response: &RawResponse) -> Result<Vec<u8>> {
    ensure_success(response)?;
    if !response.content_type_contains(PDF_CONTENT_TYPE) {
        return Err(ClientError::UnexpectedContent {
            expected: PDF_CONTENT_TYPE,
            message: failure_message(response),
        });
    }
    Ok(response.body.clone())
}

/// Interpret an HTML `/report` response, returning the document markup.
pub fn interpret_report_html(response: &RawResponse) -> Result<String> {
    ensure_success(response)?;
    let value = parse_json(response, "html report")?;

    if let Some(message) = error_field(&value) {
        return Err(ClientError::Application { message });
    }

    value
        .get("html_content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::UnexpectedContent {
            expected: "html report",
            message: "report response did not include html_content".to_string(),
        })
}

/// Interpret a `/download_data` response, returning the CSV bytes.
pub fn interpret_download(response: &RawResponse) -> Result<Vec<u8>> {
    ensure_success(response)?;
    Ok(response.body.clone())
}

/// Interpret a `/login` response.
///
/// JSON bodies fail on a non-2xx status or an `error` field; other bodies
/// fail only on a non-2xx status.
pub fn interpret_login(response: &RawResponse) -> Result<()> {
    ensure_success(response)?;
    if response.content_type_contains("application/json")
        && let Ok(value) = serde_json::from_slice::<Value>(&response.body)
        && let Some(message) = error_field(&value)
    {
        return Err(ClientError::Application { message });
    }
    Ok(())
}

/// Interpret a `/me` response.
pub fn interpret_session(response: &RawResponse) -> Result<SessionStatus> {
    ensure_success(response)?;
    let value = parse_json(response, "session status")?;
    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedContent {
        expected: "session status",
        message: format!("malformed session status: {e}"),
    })
}

/// Interpret a `/profile` response.
pub fn interpret_profile(response: &RawResponse) -> Result<User> {
    ensure_success(response)?;
    let value = parse_json(response, "profile")?;
    if let Some(message) = error_field(&value) {
        return Err(ClientError::Application { message });
    }
    serde_json::from_value::<ProfileResponse>(value)
        .map(|profile| profile.user)
        .map_err(|e| ClientError::UnexpectedContent {
            expected: "profile",
            message: format!("malformed profile: {e}"),
        })
}
