//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use asdp_client::{
    ApiRequest, ClientError, ExportSink, HttpSession, RawResponse, Result, Transport,
    WorkflowController,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// Transport answering from a script and recording every request.
///
/// A gated transport holds each response until [`ScriptedTransport::release`].
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Notify>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Notify::new()),
            ..Self::default()
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn push(&self, response: RawResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(RawResponse::json(status, &body));
    }

    pub fn push_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests().pop().expect("no request sent")
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport script exhausted")
    }
}

/// Export sink keeping files in memory.
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap().clone()
    }
}

impl ExportSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }

    fn open_document(&self, file_name: &str, html: &str) -> Result<PathBuf> {
        self.save(file_name, html.as_bytes())
    }
}

pub type TestController = WorkflowController<ScriptedTransport, HttpSession<ScriptedTransport>>;

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 9).unwrap()
}

pub fn controller() -> (TestController, Arc<ScriptedTransport>, Arc<MemorySink>) {
    controller_with(ScriptedTransport::new())
}

pub fn controller_with(
    transport: Arc<ScriptedTransport>,
) -> (TestController, Arc<ScriptedTransport>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let controller = WorkflowController::new(
        Arc::clone(&transport),
        HttpSession::new(Arc::clone(&transport)),
        Arc::clone(&sink) as Arc<dyn ExportSink>,
    )
    .with_clock(fixed_clock);
    (controller, transport, sink)
}

pub fn upload_body() -> Value {
    json!({
        "success": true,
        "summary": {
            "rows": 100,
            "columns": 5,
            "column_names": ["a", "b", "c", "d", "e"],
            "data_types": {
                "a": "int64",
                "b": "float64",
                "c": "object",
                "d": "float32",
                "e": "object"
            },
            "missing_values": ["b"]
        },
        "dataset_id": "ds1"
    })
}

pub fn clean_body() -> Value {
    json!({
        "success": true,
        "cleaning_log": ["Imputed 3 missing values in b using mean"],
        "estimates": {
            "a": {
                "unweighted": {
                    "mean": 41.5,
                    "std": 12.25,
                    "se": 1.225,
                    "ci_95_lower": 39.099,
                    "ci_95_upper": 43.901
                }
            }
        },
        "plots": {"a_hist": "<div>plot</div>"}
    })
}
