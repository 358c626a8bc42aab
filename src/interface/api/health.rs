use super::dto::ApiResponse;
use axum::Json;

/// Liveness probe
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK"))
}
