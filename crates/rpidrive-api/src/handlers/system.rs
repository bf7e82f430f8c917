//! Host statistics for administrators.

use axum::Json;
use axum::extract::State;

use rpidrive_service::system::{NetworkStats, SystemDetails};

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /ui-api/system/details
pub async fn details(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SystemDetails>, ApiError> {
    Ok(Json(state.system_service.details(&auth).await?))
}

/// GET /ui-api/system/network
pub async fn network(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NetworkStats>, ApiError> {
    Ok(Json(state.system_service.network(&auth).await?))
}
