//! Call job intake integration tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use outbound_caller::application::entrypoint::CallJob;
use outbound_caller::application::worker::JobRunner;
use outbound_caller::domain::dispatch::{
    DispatchError, DispatchReceipt, DispatchRequest, Dispatcher,
};
use outbound_caller::interface::api::{build_router, AppState, FormDefaults};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // For `oneshot`

struct UnusedDispatcher;

#[async_trait]
impl Dispatcher for UnusedDispatcher {
    async fn dispatch(&self, _request: &DispatchRequest) -> Result<DispatchReceipt, DispatchError> {
        Err(DispatchError::Io("not used".to_string()))
    }

    fn program(&self) -> String {
        "unused".to_string()
    }
}

#[derive(Default)]
struct RecordingRunner {
    jobs: Mutex<Vec<CallJob>>,
}

impl JobRunner for RecordingRunner {
    fn spawn(&self, job: CallJob) {
        self.jobs.lock().unwrap().push(job);
    }
}

fn app(runner: Arc<RecordingRunner>) -> Router {
    build_router(
        AppState {
            dispatcher: Arc::new(UnusedDispatcher),
            jobs: runner,
            form_defaults: FormDefaults::default(),
        },
        None,
    )
}

fn post_job(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/jobs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_job_is_accepted_and_spawned() {
    let runner = Arc::new(RecordingRunner::default());
    let metadata = json!({"phone_number": "+918980579954", "transfer_to": "+17345214522"});

    let response = app(runner.clone())
        .oneshot(post_job(json!({
            "job_id": "job-1",
            "room_name": "call-1",
            "metadata": metadata.to_string(),
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["job_id"], "job-1");
    assert_eq!(json["data"]["room_name"], "call-1");

    let jobs = runner.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].room_name, "call-1");
}

#[tokio::test]
async fn test_job_id_is_generated_when_missing() {
    let runner = Arc::new(RecordingRunner::default());
    let response = app(runner.clone())
        .oneshot(post_job(json!({
            "room_name": "call-2",
            "metadata": r#"{"phone_number": "+918980579954"}"#,
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert!(json["data"]["job_id"].as_str().unwrap().starts_with("job-"));
}

#[tokio::test]
async fn test_invalid_metadata_is_rejected() {
    let runner = Arc::new(RecordingRunner::default());

    for metadata in ["not json", r#"{"transfer_to": "+17345214522"}"#, r#"{"phone_number": "abc"}"#] {
        let response = app(runner.clone())
            .oneshot(post_job(json!({"room_name": "call-3", "metadata": metadata})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    assert!(runner.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let response = app(Arc::new(RecordingRunner::default()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"], "OK");
}
