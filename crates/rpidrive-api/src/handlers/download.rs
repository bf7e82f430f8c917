//! Range-aware file streaming for `/download/{id}` and `/quick-access`.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::Response;
use tracing::debug;
use uuid::Uuid;

use rpidrive_core::error::AppError;
use rpidrive_service::file::DownloadTarget;
use rpidrive_storage::range::{self, ByteRange, RangeRequest};

use crate::dto::request::QuickAccessQuery;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

/// GET /download/{id}
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let target = state.file_service.download(&auth, id).await?;
    stream_file(target, &headers).await
}

/// GET /quick-access?key={link id}
pub async fn quick_access(
    State(state): State<AppState>,
    Query(query): Query<QuickAccessQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let key = query
        .link_id()
        .ok_or_else(|| AppError::not_found("Link not found"))?;
    let target = state.file_service.quick_access(key).await?;
    stream_file(target, &headers).await
}

/// Build a 200, 206 or 416 response for `target` honoring the `Range` header.
pub async fn stream_file(target: DownloadTarget, headers: &HeaderMap) -> Result<Response, ApiError> {
    let size = target.size;
    let requested = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let (status, span) = match RangeRequest::resolve(requested, size) {
        RangeRequest::Full => (StatusCode::OK, ByteRange::full(size)),
        RangeRequest::Partial(span) => (StatusCode::PARTIAL_CONTENT, span),
        RangeRequest::Unsatisfiable => {
            return build(
                Response::builder()
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::ACCEPT_RANGES, "bytes")
                    .header(
                        header::CONTENT_RANGE,
                        RangeRequest::unsatisfied_content_range(size),
                    ),
                Body::empty(),
            );
        }
    };

    debug!(file_id = %target.file.id, start = span.start, length = span.length, "Streaming file");
    let stream = range::open_stream(&target.path, span).await?;

    let content_type = if target.file.media_type.is_empty() {
        OCTET_STREAM
    } else {
        target.file.media_type.as_str()
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, span.length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_DISPOSITION, content_disposition(&target.file.name));
    if status == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(header::CONTENT_RANGE, span.content_range(size));
    }
    build(builder, Body::from_stream(stream))
}

fn build(builder: axum::http::response::Builder, body: Body) -> Result<Response, ApiError> {
    builder
        .body(body)
        .map_err(|e| ApiError(AppError::internal(format!("Response build failed: {e}"))))
}

/// `inline` disposition with an RFC 5987 encoded file name.
pub fn content_disposition(name: &str) -> HeaderValue {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    HeaderValue::from_str(&format!("inline; filename*=UTF-8''{encoded}"))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}
