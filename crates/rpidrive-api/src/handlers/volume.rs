//! Volume handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use rpidrive_service::VolumeService;
use rpidrive_service::volume::{NamedValue, UpdateVolumeRequest, VolumeDetails, VolumeSummary};

use crate::dto::request::CreateVolumeRequest;
use crate::dto::response::{EmptyResponse, IdResponse, ValuesResponse};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /ui-api/volumes
pub async fn list_volumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ValuesResponse<VolumeSummary>>, ApiError> {
    let volumes = state.volume_service.list(&auth).await?;
    Ok(Json(ValuesResponse::new(volumes)))
}

/// POST /ui-api/volumes/create
pub async fn create_volume(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateVolumeRequest>,
) -> Result<(StatusCode, Json<IdResponse<Uuid>>), ApiError> {
    let volume = state.volume_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: volume.id })))
}

/// GET /ui-api/volumes/kinds
pub async fn volume_kinds(_auth: AuthUser) -> Json<ValuesResponse<NamedValue>> {
    Json(ValuesResponse::new(VolumeService::kinds()))
}

/// GET /ui-api/volumes/permissions
pub async fn volume_permissions(_auth: AuthUser) -> Json<ValuesResponse<NamedValue>> {
    Json(ValuesResponse::new(VolumeService::permissions()))
}

/// GET /ui-api/volumes/{id}
pub async fn get_volume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VolumeDetails>, ApiError> {
    Ok(Json(state.volume_service.get(&auth, id).await?))
}

/// PUT /ui-api/volumes/{id}
pub async fn update_volume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateVolumeRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.volume_service.update(&auth, id, req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// DELETE /ui-api/volumes/{id}
pub async fn delete_volume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.volume_service.delete(&auth, id).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/volumes/{id}/index
pub async fn index_volume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.volume_service.request_index(&auth, id).await?;
    Ok(Json(EmptyResponse::default()))
}
