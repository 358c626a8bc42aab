//! Dispatch form integration tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mockall::mock;
use outbound_caller::application::entrypoint::CallJob;
use outbound_caller::application::worker::JobRunner;
use outbound_caller::domain::dispatch::{
    DispatchError, DispatchReceipt, DispatchRequest, Dispatcher, MISSING_PHONE_NUMBER,
};
use outbound_caller::interface::api::{build_router, AppState, FormDefaults};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`

mock! {
    pub Dispatch {}

    #[async_trait]
    impl Dispatcher for Dispatch {
        async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchReceipt, DispatchError>;
        fn program(&self) -> String;
    }
}

struct NoJobs;

impl JobRunner for NoJobs {
    fn spawn(&self, _job: CallJob) {
        panic!("no job expected");
    }
}

fn app(dispatcher: MockDispatch) -> Router {
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
        jobs: Arc::new(NoJobs),
        form_defaults: FormDefaults {
            phone_number: "+918980579954".to_string(),
            transfer_to: "+17345214522".to_string(),
        },
    };
    build_router(state, None)
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/dispatch")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_form_is_prefilled() {
    let response = app(MockDispatch::new())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>Outbound Caller</h1>"));
    assert!(html.contains(r#"value="+918980579954""#));
    assert!(html.contains(r#"value="+17345214522""#));
}

#[tokio::test]
async fn test_empty_phone_number_is_rejected_without_dispatch() {
    for body in ["phone_number=&transfer_to=%2B17345214522", "phone_number=+++&transfer_to="] {
        let mut dispatcher = MockDispatch::new();
        dispatcher.expect_dispatch().times(0);

        let response = app(dispatcher).oneshot(form_post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains(MISSING_PHONE_NUMBER));
        assert!(!html.contains("Dispatching call to"));
    }
}

#[tokio::test]
async fn test_successful_dispatch_shows_output_and_warnings() {
    let mut dispatcher = MockDispatch::new();
    dispatcher
        .expect_dispatch()
        .withf(|request: &DispatchRequest| {
            request.phone_number().as_str() == "+918980579954"
                && request.metadata().contains("+17345214522")
        })
        .times(1)
        .returning(|_| {
            Ok(DispatchReceipt {
                stdout: "Dispatch created: <AD_123>".to_string(),
                stderr: "using default project".to_string(),
            })
        });

    let response = app(dispatcher)
        .oneshot(form_post(
            "phone_number=%2B918980579954&transfer_to=%2B17345214522",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Dispatching call to +918980579954..."));
    assert!(html.contains("Call dispatched successfully!"));
    assert!(html.contains("Dispatch created: &lt;AD_123&gt;"));
    assert!(html.contains("using default project"));
}

#[tokio::test]
async fn test_missing_cli_is_reported() {
    let mut dispatcher = MockDispatch::new();
    dispatcher
        .expect_dispatch()
        .times(1)
        .returning(|_| Err(DispatchError::NotFound("lk".to_string())));
    dispatcher.expect_program().returning(|| "lk".to_string());

    let response = app(dispatcher)
        .oneshot(form_post("phone_number=%2B918980579954&transfer_to="))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("Dispatch CLI (lk) not found."));
}

#[tokio::test]
async fn test_failed_command_shows_both_streams() {
    let mut dispatcher = MockDispatch::new();
    dispatcher.expect_dispatch().times(1).returning(|_| {
        Err(DispatchError::CommandFailed {
            status: "exit status: 1".to_string(),
            stdout: "partial output".to_string(),
            stderr: "agent not registered".to_string(),
        })
    });
    dispatcher.expect_program().returning(|| "lk".to_string());

    let response = app(dispatcher)
        .oneshot(form_post("phone_number=%2B918980579954&transfer_to="))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("Failed to dispatch call"));
    assert!(html.contains("agent not registered"));
    assert!(html.contains("partial output"));
}
