//! Job listing and cancellation.

use axum::Json;
use axum::extract::{Path, State};

use rpidrive_entity::job::Job;

use crate::dto::response::{EmptyResponse, ValuesResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /ui-api/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ValuesResponse<Job>>, ApiError> {
    Ok(Json(ValuesResponse::new(state.job_service.list(&auth).await?)))
}

/// POST /ui-api/jobs/{id}/cancel
pub async fn cancel_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.job_service.cancel(&auth, id).await?;
    Ok(Json(EmptyResponse::default()))
}
