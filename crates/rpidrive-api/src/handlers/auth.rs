//! Session handlers: login, logout, check, self.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::warn;

use rpidrive_entity::user::UserSummary;

use crate::dto::request::LoginRequest;
use crate::dto::response::{EmptyResponse, FlagResponse};
use crate::error::ApiError;
use crate::extractors::auth::AuthRejection;
use crate::extractors::{AuthUser, SESSION_COOKIE, ValidatedJson};
use crate::state::AppState;

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    if let Some(domain) = &state.config.security.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// POST /ui-api/users/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<EmptyResponse>), ApiError> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;
    let session = state.sessions.create(user.id).await?;

    let jar = jar.add(session_cookie(&state, session.token));
    Ok((jar, Json(EmptyResponse::default())))
}

/// POST /ui-api/users/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<EmptyResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.sessions.destroy(cookie.value()).await {
            warn!(error = %e, "Failed to destroy session");
        }
    }
    let jar = jar.remove(session_cookie(&state, String::new()));
    (jar, Json(EmptyResponse::default()))
}

/// GET /ui-api/users/check
pub async fn check(auth: Result<AuthUser, AuthRejection>) -> Response {
    match auth {
        Ok(_) => Json(FlagResponse { flag: true }).into_response(),
        Err(AuthRejection::Failed(err)) => ApiError(err).into_response(),
        Err(_) => (StatusCode::FORBIDDEN, Json(FlagResponse { flag: false })).into_response(),
    }
}

/// GET /ui-api/users/self
pub async fn current_user(auth: AuthUser) -> Json<UserSummary> {
    Json(auth.user.summary())
}
