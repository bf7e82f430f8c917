//! User administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use rpidrive_entity::user::UserSummary;
use rpidrive_service::user::UpdateUserRequest;

use crate::dto::request::CreateUserRequest;
use crate::dto::response::{EmptyResponse, IdResponse, ValuesResponse};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /ui-api/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ValuesResponse<UserSummary>>, ApiError> {
    let users = state.user_service.list(&auth).await?;
    Ok(Json(ValuesResponse::new(
        users.iter().map(|u| u.summary()).collect(),
    )))
}

/// POST /ui-api/users/create
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<IdResponse<i32>>), ApiError> {
    let user = state.user_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: user.id })))
}

/// GET /ui-api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<UserSummary>, ApiError> {
    let user = state.user_service.get(&auth, id).await?;
    Ok(Json(user.summary()))
}

/// PUT /ui-api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.user_service.update(&auth, id, req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// DELETE /ui-api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
