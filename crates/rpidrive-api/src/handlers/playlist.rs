//! Playlist handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use rpidrive_entity::playlist::Playlist;
use rpidrive_service::playlist::{PlaylistAction, PlaylistDetails};

use crate::dto::request::NameRequest;
use crate::dto::response::{EmptyResponse, PlaylistCreated, ValuesResponse};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /ui-api/playlists
pub async fn list_playlists(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ValuesResponse<Playlist>>, ApiError> {
    Ok(Json(ValuesResponse::new(
        state.playlist_service.list(&auth).await?,
    )))
}

/// POST /ui-api/playlists/create
pub async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<NameRequest>,
) -> Result<(StatusCode, Json<PlaylistCreated>), ApiError> {
    let playlist = state.playlist_service.create(&auth, &req.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlaylistCreated {
            id: playlist.id,
            name: playlist.name,
        }),
    ))
}

/// GET /ui-api/playlists/{id}
pub async fn get_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<PlaylistDetails>, ApiError> {
    Ok(Json(state.playlist_service.get(&auth, id).await?))
}

/// POST /ui-api/playlists/{id}
pub async fn update_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ApiJson(action): ApiJson<PlaylistAction>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.playlist_service.apply(&auth, id, action).await?;
    Ok(Json(EmptyResponse::default()))
}

/// DELETE /ui-api/playlists/{id}
pub async fn delete_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.playlist_service.delete(&auth, id).await?;
    Ok(Json(EmptyResponse::default()))
}
