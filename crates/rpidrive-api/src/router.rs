//! Route definitions for the RPi Drive HTTP API.
//!
//! JSON endpoints are mounted under `/ui-api`; file streaming lives at the
//! root so that links stay short.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let max_body = usize::try_from(state.config.web.max_body_bytes).unwrap_or(usize::MAX);

    let ui_api = Router::new()
        .merge(auth_routes(&state))
        .merge(user_routes())
        .merge(volume_routes())
        .merge(file_routes())
        .merge(job_routes())
        .merge(playlist_routes())
        .merge(system_routes())
        .layer(CompressionLayer::new());

    // Range responses must reach the client byte for byte, so no compression.
    let streaming = Router::new()
        .route("/download/{id}", get(handlers::download::download))
        .route("/quick-access", get(handlers::download::quick_access));

    Router::new()
        .nest("/ui-api", ui_api)
        .merge(streaming)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Session endpoints; login is wrapped by the brute-force guard.
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/users/login",
            post(handlers::auth::login).route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                middleware::bruteforce::login_guard,
            )),
        )
        .route("/users/logout", post(handlers::auth::logout))
        .route("/users/check", get(handlers::auth::check))
        .route("/users/self", get(handlers::auth::current_user))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::user::list_users))
        .route("/users/create", post(handlers::user::create_user))
        .route(
            "/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
}

fn volume_routes() -> Router<AppState> {
    Router::new()
        .route("/volumes", get(handlers::volume::list_volumes))
        .route("/volumes/create", post(handlers::volume::create_volume))
        .route("/volumes/kinds", get(handlers::volume::volume_kinds))
        .route("/volumes/permissions", get(handlers::volume::volume_permissions))
        .route(
            "/volumes/{id}",
            get(handlers::volume::get_volume)
                .put(handlers::volume::update_volume)
                .delete(handlers::volume::delete_volume),
        )
        .route("/volumes/{id}/index", post(handlers::volume::index_volume))
}

fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/compress", post(handlers::file::compress_files))
        .route("/files/delete", post(handlers::file::delete_files))
        .route("/files/move", post(handlers::file::move_files))
        .route("/files/search", get(handlers::file::search_files))
        .route(
            "/files/{id}",
            get(handlers::file::get_file).delete(handlers::file::delete_file),
        )
        .route("/files/{id}/new-folder", post(handlers::file::new_folder))
        .route("/files/{id}/rename", post(handlers::file::rename_file))
        .route("/files/{id}/share", post(handlers::file::share_file))
        .route("/files/{id}/thumbnail", get(handlers::file::thumbnail))
        .route("/files/{id}/upload", post(handlers::file::upload_files))
}

fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(handlers::job::list_jobs))
        .route("/jobs/{id}/cancel", post(handlers::job::cancel_job))
}

fn playlist_routes() -> Router<AppState> {
    Router::new()
        .route("/playlists", get(handlers::playlist::list_playlists))
        .route("/playlists/create", post(handlers::playlist::create_playlist))
        .route(
            "/playlists/{id}",
            get(handlers::playlist::get_playlist)
                .post(handlers::playlist::update_playlist)
                .delete(handlers::playlist::delete_playlist),
        )
}

fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/system/details", get(handlers::system::details))
        .route("/system/network", get(handlers::system::network))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use rpidrive_cache::CacheManager;
    use rpidrive_core::config::{AppConfig, RedisConfig};
    use rpidrive_database::PgPool;

    use super::*;

    /// State whose pool never connects; only routes that fail before
    /// touching the database may be exercised.
    fn offline_state() -> AppState {
        let mut config = AppConfig::default();
        config.web.secret_key = "test-secret".to_string();
        config.security.block_trigger = 3;
        config.reverse_proxy.ip_header = Some("X-Forwarded-For".to_string());
        let pool = PgPool::connect_lazy("postgres://nobody@127.0.0.1:1/none").unwrap();
        let cache = CacheManager::memory(&RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        })
        .unwrap();
        AppState::build(config, pool, cache)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_check_without_session() {
        let app = build_router(offline_state());
        let response = app
            .oneshot(Request::get("/ui-api/users/check").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["flag"], false);
    }

    #[tokio::test]
    async fn test_login_required_json_and_browser() {
        let app = build_router(offline_state());

        let response = app
            .clone()
            .oneshot(
                Request::get("/ui-api/jobs")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(Request::get("/ui-api/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/login?next=/ui-api/jobs");
    }

    #[tokio::test]
    async fn test_malformed_quick_access_key_is_not_found() {
        let app = build_router(offline_state());
        let response = app
            .oneshot(
                Request::get("/quick-access?key=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_guard_blocks_after_trigger() {
        let app = build_router(offline_state());
        let attempt = || {
            Request::post("/ui-api/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "198.51.100.7")
                .body(Body::from(r#"{"username":"","password":""}"#))
                .unwrap()
        };

        for _ in 0..3 {
            let response = app.clone().oneshot(attempt()).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        let response = app.oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await["error"],
            rpidrive_auth::bruteforce::BLOCKED_MESSAGE
        );
    }
}
