//! Call job intake

use super::dto::{ApiResponse, JobAccepted};
use super::state::AppState;
use crate::application::entrypoint::CallJob;
use crate::domain::dial_info::DialInfo;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

/// `POST /jobs`: validate the job and hand it to the worker
pub async fn submit_job(
    State(state): State<AppState>,
    Json(job): Json<CallJob>,
) -> (StatusCode, Json<ApiResponse<JobAccepted>>) {
    if job.room_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("room_name is required".to_string())),
        );
    }

    if let Err(e) = DialInfo::from_metadata(&job.metadata) {
        warn!(job_id = %job.job_id, "rejected call job: {}", e);
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())));
    }

    info!(job_id = %job.job_id, room = %job.room_name, "accepted call job");
    let accepted = JobAccepted {
        job_id: job.job_id.clone(),
        room_name: job.room_name.clone(),
    };
    state.jobs.spawn(job);

    (StatusCode::ACCEPTED, Json(ApiResponse::success(accepted)))
}
