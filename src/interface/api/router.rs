//! API Router configuration

use super::dispatch_form::{show_form, submit_dispatch};
use super::health::health_check;
use super::jobs_handler::submit_job;
use super::metrics_handler::metrics_handler;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the router. `/metrics` is only mounted when a recorder handle is given.
pub fn build_router(state: AppState, prometheus_handle: Option<PrometheusHandle>) -> Router {
    let form_routes = Router::new()
        .route("/", get(show_form))
        .route("/dispatch", post(submit_dispatch));

    let job_routes = Router::new().route("/jobs", post(submit_job));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(form_routes)
        .merge(job_routes)
        .with_state(state);

    if let Some(handle) = prometheus_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        router = router.merge(metrics_routes);
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
