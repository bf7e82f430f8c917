//! Login throttling per client address.
//!
//! Wraps the login route only. A blocked address never reaches the handler;
//! afterwards a 200 clears the counter and anything else increments it.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use rpidrive_core::error::ErrorKind;

use crate::error::ApiError;
use crate::extractors::client_ip::client_ip;
use crate::state::AppState;

pub async fn login_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let ip = client_ip(&parts, &state);
    let request = Request::from_parts(parts, body);

    match state.guard.check(ip.as_str()).await {
        Ok(()) => {}
        Err(err) if err.kind == ErrorKind::Blocked => return ApiError(err).into_response(),
        Err(err) => {
            // Counter store unavailable; the attempt proceeds unthrottled.
            warn!(ip = %ip.as_str(), error = %err, "Brute-force check failed");
        }
    }

    let response = next.run(request).await;

    if response.status() == StatusCode::OK {
        if let Err(err) = state.guard.record_success(ip.as_str()).await {
            warn!(ip = %ip.as_str(), error = %err, "Failed to clear login failures");
        }
    } else {
        match state.guard.record_failure(ip.as_str()).await {
            Ok(failures) if failures > 0 => {
                info!(ip = %ip.as_str(), failures, "Failed login recorded");
            }
            Ok(_) => {}
            Err(err) => warn!(ip = %ip.as_str(), error = %err, "Failed to record login failure"),
        }
    }

    response
}
