//! File handlers: details, folder creation, rename, move, delete, upload,
//! compress, share, thumbnail and search.

use std::path::PathBuf;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::extract::multipart::Field;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;
use rpidrive_entity::file::File;
use rpidrive_service::file::{CompressRequest, FileDetails, FileFields, MoveRequest, StagedUpload};
use rpidrive_storage::fs;

use crate::dto::request::{FieldsQuery, FilesRequest, NameRequest, SearchQuery};
use crate::dto::response::{EmptyResponse, IdResponse, ValuesResponse};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /ui-api/files/{id}?fields=...
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<FieldsQuery>,
) -> Result<Json<FileDetails>, ApiError> {
    let fields = FileFields::parse(query.fields.as_deref());
    Ok(Json(state.file_service.get(&auth, id, fields).await?))
}

/// DELETE /ui-api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.file_service.delete(&auth, &[id]).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/files/delete
pub async fn delete_files(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<FilesRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.file_service.delete(&auth, &req.files).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/files/{id}/new-folder
pub async fn new_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<NameRequest>,
) -> Result<(StatusCode, Json<IdResponse<Uuid>>), ApiError> {
    let folder = state.file_service.new_folder(&auth, id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: folder.id })))
}

/// POST /ui-api/files/{id}/rename
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<NameRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.file_service.rename(&auth, id, &req.name).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/files/move
pub async fn move_files(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<MoveRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.file_service.move_files(&auth, req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/files/compress
pub async fn compress_files(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CompressRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.file_service.compress(&auth, req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// POST /ui-api/files/{id}/share
pub async fn share_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<IdResponse<Uuid>>, ApiError> {
    let link = state.file_service.share(&auth, id).await?;
    Ok(Json(IdResponse { id: link.id }))
}

/// GET /ui-api/files/{id}/thumbnail
pub async fn thumbnail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let png = state.file_service.thumbnail(&auth, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        png,
    ))
}

/// GET /ui-api/files/search?keyword=...
pub async fn search_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ValuesResponse<File>>, ApiError> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::validation("Keyword is required"))?;
    let files = state.file_service.search(&auth, keyword).await?;
    Ok(Json(ValuesResponse::new(files)))
}

/// POST /ui-api/files/{id}/upload
///
/// Multipart body: `files` parts carry bytes, `paths` parts carry the
/// relative destination of the file part at the same position.
pub async fn upload_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<EmptyResponse>), ApiError> {
    let temp_dir = state.file_service.temp_dir().to_path_buf();
    let mut staged: Vec<(PathBuf, String)> = Vec::new();

    let paths = match read_upload(multipart, &temp_dir, &mut staged).await {
        Ok(paths) => paths,
        Err(e) => {
            for (path, _) in &staged {
                fs::remove_path_best_effort(path).await;
            }
            return Err(e.into());
        }
    };

    let uploads = staged
        .into_iter()
        .enumerate()
        .map(|(i, (staged, file_name))| StagedUpload {
            staged,
            relative_path: paths
                .get(i)
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .unwrap_or(file_name),
        })
        .collect();

    state.file_service.upload(&auth, id, uploads).await?;
    Ok((StatusCode::CREATED, Json(EmptyResponse::default())))
}

/// Stage every `files` part and collect the `paths` parts.
async fn read_upload(
    mut multipart: Multipart,
    temp_dir: &std::path::Path,
    staged: &mut Vec<(PathBuf, String)>,
) -> AppResult<Vec<String>> {
    let mut paths = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let dest = fs::staging_path(temp_dir).await?;
                staged.push((dest.clone(), file_name));
                write_part(field, &dest).await?;
            }
            Some("paths") => paths.push(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }
    Ok(paths)
}

async fn write_part(mut field: Field<'_>, dest: &std::path::Path) -> AppResult<()> {
    let mut out = tokio::fs::File::create(dest).await?;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    Ok(())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(format!("Invalid upload: {}", e.body_text()))
}
