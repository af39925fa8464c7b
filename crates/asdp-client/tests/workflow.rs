//! Workflow controller state machine tests against a scripted backend.

mod support;

use std::time::Duration;

use asdp_client::{ApiRequest, ClientError, SessionProvider, ToastKind, WorkflowStage};
use asdp_model::{ConfigPatch, DatasetId, ImputationConfig, ImputationMethod, ReportFormat};
use serde_json::json;
use support::{
    ScriptedTransport, TestController, clean_body, controller, controller_with, upload_body,
};

fn messages(controller: &TestController) -> Vec<(ToastKind, String)> {
    controller
        .notifier()
        .toasts()
        .into_iter()
        .map(|toast| (toast.kind, toast.message))
        .collect()
}

fn clean_body_of(request: &ApiRequest) -> serde_json::Value {
    match request {
        ApiRequest::Clean(body) => serde_json::to_value(body).unwrap(),
        other => panic!("expected a clean request, got {other:?}"),
    }
}

async fn uploaded() -> (
    TestController,
    std::sync::Arc<ScriptedTransport>,
    std::sync::Arc<support::MemorySink>,
) {
    let (controller, transport, sink) = controller();
    transport.push_json(200, upload_body());
    controller
        .submit_upload_bytes("survey.csv", b"a,b,c,d,e\n".to_vec())
        .await
        .unwrap();
    (controller, transport, sink)
}

#[tokio::test]
async fn test_round_trip_with_default_config() {
    let (controller, transport, _sink) = controller();
    assert_eq!(controller.stage(), WorkflowStage::Idle);
    assert!(controller.numeric_columns().is_empty());

    transport.push_json(200, upload_body());
    let summary = controller
        .submit_upload_bytes("survey.csv", b"a,b,c,d,e\n".to_vec())
        .await
        .unwrap();

    let expected: asdp_model::DatasetSummary =
        serde_json::from_value(upload_body()["summary"].clone()).unwrap();
    assert_eq!(summary, expected);
    assert_eq!(controller.summary(), Some(expected));
    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert_eq!(controller.dataset_id(), Some(DatasetId::from("ds1")));
    assert_eq!(controller.numeric_columns(), vec!["a", "b", "d"]);

    transport.push_json(200, clean_body());
    let result = controller.start_processing().await.unwrap();

    assert_eq!(
        clean_body_of(&transport.last_request()),
        json!({
            "config": {
                "imputation": {"method": "mean", "columns": null},
                "outliers": {
                    "detection_method": "iqr",
                    "handling_method": "winsorize",
                    "columns": null
                },
                "weights": {"column": null},
                "estimate_columns": null
            },
            "dataset_id": "ds1"
        })
    );
    assert_eq!(controller.stage(), WorkflowStage::Completed);
    assert_eq!(controller.result(), Some(result));
    assert!(!controller.is_busy());
    assert_eq!(
        messages(&controller),
        vec![
            (ToastKind::Success, "File uploaded successfully".to_string()),
            (ToastKind::Success, "Processing completed".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_failed_processing_keeps_upload() {
    let (controller, transport, _sink) = uploaded().await;

    transport.push_json(500, json!({"error": "No dataset loaded"}));
    let err = controller.start_processing().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert!(controller.result().is_none());
    assert!(controller.summary().is_some());
    assert_eq!(controller.dataset_id(), Some(DatasetId::from("ds1")));
    assert_eq!(
        messages(&controller).last(),
        Some(&(
            ToastKind::Error,
            "Processing failed: No dataset loaded".to_string()
        ))
    );
}

#[tokio::test]
async fn test_failed_rerun_clears_previous_result() {
    let (controller, transport, _sink) = uploaded().await;
    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();
    assert_eq!(controller.stage(), WorkflowStage::Completed);

    transport.push_json(200, json!({"error": "Column b not found"}));
    controller.start_processing().await.unwrap_err();

    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert!(controller.result().is_none());
}

#[tokio::test]
async fn test_failed_upload_leaves_state_unchanged() {
    let (controller, transport, _sink) = controller();

    transport.push_json(400, json!({"error": "Invalid file type"}));
    let err = controller
        .submit_upload_bytes("notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid file type");
    assert_eq!(controller.stage(), WorkflowStage::Idle);
    assert!(controller.summary().is_none());
    assert!(!controller.is_busy());
    assert_eq!(
        messages(&controller),
        vec![(
            ToastKind::Error,
            "Upload failed: Invalid file type".to_string()
        )]
    );
}

#[tokio::test]
async fn test_upload_failure_messages() {
    let (controller, transport, _sink) = controller();

    transport.push(asdp_client::RawResponse::with_body(
        200,
        "text/html",
        "Service Unavailable",
    ));
    transport.push_json(200, json!({"success": false}));
    transport.push_error(ClientError::Transport("connection refused".to_string()));

    for _ in 0..3 {
        controller
            .submit_upload_bytes("survey.csv", Vec::new())
            .await
            .unwrap_err();
    }

    let texts: Vec<_> = messages(&controller).into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        texts,
        vec![
            "Upload failed: Service Unavailable",
            "Upload failed: HTTP 200",
            "Upload failed: connection refused",
        ]
    );
}

#[tokio::test]
async fn test_reupload_keeps_stale_result() {
    let (controller, transport, _sink) = uploaded().await;
    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();

    let mut body = upload_body();
    body["dataset_id"] = json!(7);
    transport.push_json(200, body);
    controller
        .submit_upload_bytes("second.csv", Vec::new())
        .await
        .unwrap();

    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert_eq!(controller.dataset_id(), Some(DatasetId::from(7)));
    assert!(controller.result().is_some());
}

#[tokio::test]
async fn test_upload_failure_after_completion_keeps_completed() {
    let (controller, transport, _sink) = uploaded().await;
    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();

    transport.push_json(413, json!({}));
    controller
        .submit_upload_bytes("huge.csv", Vec::new())
        .await
        .unwrap_err();

    assert_eq!(controller.stage(), WorkflowStage::Completed);
    assert!(controller.result().is_some());
    assert_eq!(
        messages(&controller).last().unwrap().1,
        "Upload failed: HTTP 413"
    );
}

#[tokio::test]
async fn test_upload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.csv");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let (controller, transport, _sink) = controller();
    transport.push_json(200, upload_body());
    controller.submit_upload(&path).await.unwrap();

    match transport.last_request() {
        ApiRequest::Upload { file_name, bytes } => {
            assert_eq!(file_name, "survey.csv");
            assert_eq!(bytes, b"a,b\n1,2\n");
        }
        other => panic!("expected an upload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, transport, _sink) = controller();

    let err = controller
        .submit_upload(dir.path().join("missing.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Io(_)));
    assert!(transport.requests().is_empty());
    assert_eq!(controller.stage(), WorkflowStage::Idle);
    assert!(!controller.is_busy());
    assert!(messages(&controller)[0].1.starts_with("Upload failed: "));
}

#[tokio::test]
async fn test_processing_requires_upload() {
    let (controller, transport, _sink) = controller();

    let err = controller.start_processing().await.unwrap_err();

    assert_eq!(err, ClientError::NoDataset);
    assert!(transport.requests().is_empty());
    assert_eq!(controller.stage(), WorkflowStage::Idle);
    assert_eq!(
        messages(&controller),
        vec![(
            ToastKind::Error,
            "Processing failed: Upload a dataset first".to_string()
        )]
    );
}

#[tokio::test]
async fn test_config_patches_preserve_siblings() {
    let (controller, transport, _sink) = controller();
    assert_eq!(
        controller.update_config(ConfigPatch::estimate_columns(vec!["a".to_string()])),
        Err(ClientError::NoDataset)
    );

    transport.push_json(200, upload_body());
    controller
        .submit_upload_bytes("survey.csv", Vec::new())
        .await
        .unwrap();

    controller
        .update_config(ConfigPatch::imputation(ImputationConfig {
            method: ImputationMethod::Knn,
            columns: vec![],
        }))
        .unwrap();
    controller
        .update_config(ConfigPatch::estimate_columns(vec![
            "age".to_string(),
            "score".to_string(),
        ]))
        .unwrap();

    let config = controller.config();
    assert_eq!(config.imputation.method, ImputationMethod::Knn);
    assert_eq!(config.estimate_columns, vec!["age", "score"]);
    assert_eq!(config.outliers, Default::default());

    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();

    let sent = clean_body_of(&transport.last_request());
    assert_eq!(sent["config"]["imputation"], json!({"method": "knn", "columns": null}));
    assert_eq!(sent["config"]["estimate_columns"], json!(["age", "score"]));
}

#[tokio::test]
async fn test_second_request_while_busy_is_rejected() {
    let (controller, transport, _sink) = controller_with(ScriptedTransport::gated());
    transport.push_json(200, upload_body());

    let first = controller.submit_upload_bytes("survey.csv", Vec::new());
    let second = async {
        tokio::task::yield_now().await;
        assert!(controller.is_busy());
        assert_eq!(controller.stage(), WorkflowStage::Uploading);

        let upload = controller
            .submit_upload_bytes("other.csv", Vec::new())
            .await;
        let process = controller.start_processing().await;
        transport.release();
        (upload, process)
    };

    let (first, (upload, process)) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert_eq!(upload, Err(ClientError::Busy));
    assert_eq!(process, Err(ClientError::Busy));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert!(!controller.is_busy());

    let texts: Vec<_> = messages(&controller).into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        texts,
        vec![
            "Upload failed: Another request is already in progress",
            "Processing failed: Another request is already in progress",
            "File uploaded successfully",
        ]
    );
}

#[tokio::test]
async fn test_dropped_request_releases_slot() {
    let transport = ScriptedTransport::gated();
    let (controller, transport, _sink) = controller_with(transport);
    transport.push_json(200, upload_body());
    transport.release();
    controller
        .submit_upload_bytes("survey.csv", Vec::new())
        .await
        .unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), controller.start_processing()).await;

    assert!(abandoned.is_err());
    assert!(!controller.is_busy());
    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert!(controller.result().is_none());
}

#[tokio::test]
async fn test_unauthorized_refreshes_session() {
    let (controller, transport, _sink) = uploaded().await;

    transport.push_json(401, json!({"error": "Authentication required"}));
    transport.push_json(200, json!({"authenticated": false}));
    controller.start_processing().await.unwrap_err();

    let requests = transport.requests();
    assert!(matches!(requests.last(), Some(ApiRequest::Me)));
    assert!(controller.session().current_user().is_none());
    assert_eq!(
        messages(&controller).last().unwrap().1,
        "Processing failed: Authentication required"
    );
}

#[tokio::test]
async fn test_pdf_report_with_wrong_content_type() {
    let (controller, transport, sink) = uploaded().await;
    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();
    let before = controller.snapshot();

    transport.push(asdp_client::RawResponse::with_body(
        200,
        "text/html; charset=utf-8",
        "Report generation failed",
    ));
    let err = controller
        .generate_report(ReportFormat::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::UnexpectedContent { .. }));
    assert!(sink.files().is_empty());
    assert_eq!(controller.snapshot(), before);
    assert_eq!(
        messages(&controller).last(),
        Some(&(
            ToastKind::Error,
            "Report failed: Report generation failed".to_string()
        ))
    );
}

#[tokio::test]
async fn test_failed_html_report_saves_nothing() {
    let (controller, transport, sink) = uploaded().await;
    transport.push_json(200, clean_body());
    controller.start_processing().await.unwrap();
    let before = controller.snapshot();

    transport.push_json(400, json!({"error": "No processed data available"}));
    controller
        .generate_report(ReportFormat::Html)
        .await
        .unwrap_err();
    transport.push_json(200, json!({"status": "ok"}));
    controller
        .generate_report(ReportFormat::Html)
        .await
        .unwrap_err();

    assert!(sink.files().is_empty());
    assert_eq!(controller.snapshot(), before);
    let toasts = messages(&controller);
    let failures: Vec<_> = toasts
        .iter()
        .filter(|(kind, _)| *kind == ToastKind::Error)
        .map(|(_, message)| message.as_str())
        .collect();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0], "Report failed: No processed data available");
    assert!(failures[1].starts_with("Report failed: "));
}

#[tokio::test]
async fn test_pdf_report_is_saved() {
    let (controller, transport, sink) = uploaded().await;
    transport.push(asdp_client::RawResponse::with_body(
        200,
        "application/pdf",
        b"%PDF-1.7".to_vec(),
    ));

    let path = controller.generate_report(ReportFormat::Pdf).await.unwrap();

    assert_eq!(
        path.to_str(),
        Some("survey_report_2026-10-19T08-05-09.pdf")
    );
    assert_eq!(
        sink.files(),
        vec![(
            "survey_report_2026-10-19T08-05-09.pdf".to_string(),
            b"%PDF-1.7".to_vec()
        )]
    );
    assert_eq!(controller.stage(), WorkflowStage::Summarized);
    assert_eq!(
        messages(&controller).last().unwrap().1,
        "Report saved to survey_report_2026-10-19T08-05-09.pdf"
    );
}

#[tokio::test]
async fn test_html_report_is_opened() {
    let (controller, transport, sink) = uploaded().await;
    transport.push_json(200, json!({"html_content": "<html><body>Report</body></html>"}));

    controller.generate_report(ReportFormat::Html).await.unwrap();

    match transport.last_request() {
        ApiRequest::Report(request) => assert_eq!(request.format, ReportFormat::Html),
        other => panic!("expected a report request, got {other:?}"),
    }
    let files = sink.files();
    assert_eq!(files[0].0, "survey_report_2026-10-19T08-05-09.html");
    assert_eq!(files[0].1, b"<html><body>Report</body></html>");
}

#[tokio::test]
async fn test_download_processed_data() {
    let (controller, transport, sink) = uploaded().await;

    transport.push_json(400, json!({"error": "No data available"}));
    controller.download_processed_data().await.unwrap_err();
    assert_eq!(
        messages(&controller).last().unwrap().1,
        "Download failed: No data available"
    );

    transport.push(asdp_client::RawResponse::with_body(
        200,
        "text/csv",
        "a,b\n1,2\n",
    ));
    controller.download_processed_data().await.unwrap();

    assert_eq!(
        sink.files(),
        vec![(
            "processed_data_2026-10-19T08-05-09.csv".to_string(),
            b"a,b\n1,2\n".to_vec()
        )]
    );
    assert!(matches!(transport.last_request(), ApiRequest::DownloadData));
}
