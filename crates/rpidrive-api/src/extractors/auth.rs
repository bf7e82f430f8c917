//! `AuthUser` extractor: reads the session cookie, validates it and loads the
//! acting user.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use rpidrive_core::error::AppError;
use rpidrive_service::RequestContext;

use crate::error::ApiError;
use crate::extractors::client_ip::client_ip;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "rpidrive_session";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Whether the client expects JSON rather than an HTML page.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let mentions_json = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    };
    mentions_json(header::ACCEPT)
        || mentions_json(header::CONTENT_TYPE)
        || headers.contains_key("x-requested-with")
}

/// Rejection for a request without a usable session.
#[derive(Debug)]
pub enum AuthRejection {
    /// JSON clients get a 401 envelope.
    Unauthorized(AppError),
    /// Browsers are sent to the login page.
    Login { next: String },
    /// A failure while resolving the session.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(err) | Self::Failed(err) => ApiError(err).into_response(),
            Self::Login { next } => {
                let location = format!("/login?next={}", encode_next(&next));
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
        }
    }
}

/// Percent-encode a path for the `next` query parameter.
fn encode_next(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(ctx) => Ok(AuthUser(ctx)),
            Err(err) if ApiError::status_for(err.kind) == StatusCode::UNAUTHORIZED => {
                if wants_json(&parts.headers) {
                    Err(AuthRejection::Unauthorized(err))
                } else {
                    let uri = parts
                        .extensions
                        .get::<OriginalUri>()
                        .map(|OriginalUri(uri)| uri)
                        .unwrap_or(&parts.uri);
                    let next = uri
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_else(|| "/".to_string());
                    Err(AuthRejection::Login { next })
                }
            }
            Err(err) => Err(AuthRejection::Failed(err)),
        }
    }
}

/// Resolve the request's session into a context, or fail with
/// `Authentication`.
pub async fn authenticate(parts: &Parts, state: &AppState) -> Result<RequestContext, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::authentication("Login required"))?;

    let claims = state.sessions.validate(&token).await?;
    let user = state.user_service.active_user(claims.user_id()?).await?;
    let ip = client_ip(parts, state);

    Ok(RequestContext::new(user, claims.sid, ip.0))
}
