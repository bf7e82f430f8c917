//! Shared test helpers for integration tests.
//!
//! Every test needs a PostgreSQL database named by `RPIDRIVE_TEST_DATABASE_URL`;
//! when the variable is unset, [`TestApp::new`] returns `None` and the test
//! returns early. Tests share the database, so every name they create is
//! made unique with [`unique`].

#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use rpidrive_api::AppState;
use rpidrive_api::extractors::SESSION_COOKIE;
use rpidrive_cache::CacheManager;
use rpidrive_core::config::AppConfig;
use rpidrive_database::PgPool;
use rpidrive_database::connection::DatabasePool;
use rpidrive_entity::user::User;
use rpidrive_service::user::CreateUserRequest;

/// Environment variable naming the test database.
pub const TEST_DATABASE_ENV: &str = "RPIDRIVE_TEST_DATABASE_URL";

const MULTIPART_BOUNDARY: &str = "rpidrive-test-boundary";

/// `<prefix>-<8 hex chars>`
pub fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// Test application context
pub struct TestApp {
    /// The Axum application for making test requests
    pub router: Router,
    /// Shared state, for driving services directly
    pub state: AppState,
    /// Database pool for direct queries
    pub db_pool: PgPool,
    /// Application config
    pub config: AppConfig,
    /// Staging directory and volume roots; removed on drop
    pub scratch: TempDir,
}

impl TestApp {
    /// Create a new test application with the default test configuration
    pub async fn new() -> Option<Self> {
        Self::with_config(|_| {}).await
    }

    /// Create a new test application, adjusting the configuration first
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Option<Self> {
        let Ok(url) = std::env::var(TEST_DATABASE_ENV) else {
            eprintln!("{TEST_DATABASE_ENV} is not set; skipping");
            return None;
        };

        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        let mut config = AppConfig::default();
        config.web.secret_key = "integration-test-secret".to_string();
        config.web.temp_dir = scratch.path().join("staging");
        config.redis.enabled = false;
        adjust(&mut config);
        std::fs::create_dir_all(&config.web.temp_dir).expect("Failed to create staging dir");

        let db_pool = DatabasePool::connect_url(&url, 5, 10)
            .await
            .expect("Failed to connect to test database")
            .into_pool();
        rpidrive_database::migration::run_migrations(&db_pool)
            .await
            .expect("Failed to run migrations");

        let cache = CacheManager::memory(&config.redis).expect("Failed to init cache");
        let state = AppState::build(config.clone(), db_pool.clone(), cache);
        let router = rpidrive_api::build_app(state.clone());

        Some(Self {
            router,
            state,
            db_pool,
            config,
            scratch,
        })
    }

    /// Create a user directly through the service layer
    pub async fn create_user(&self, username: &str, password: &str, superuser: bool) -> User {
        self.state
            .user_service
            .create_unchecked(CreateUserRequest {
                username: username.to_string(),
                email: String::new(),
                password: password.to_string(),
                is_superuser: superuser,
                is_active: true,
            })
            .await
            .expect("Failed to create test user")
    }

    /// Create a superuser with a unique name and log in; returns the cookie
    pub async fn admin_session(&self) -> String {
        let username = unique("admin");
        self.create_user(&username, "admin-password", true).await;
        self.login(&username, "admin-password").await
    }

    /// Login and return the `Cookie` header value carrying the session
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/ui-api/users/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response
            .session_cookie()
            .expect("No session cookie in login response")
    }

    /// Make a directory under the scratch area for use as a volume root
    pub fn volume_dir(&self, name: &str) -> std::path::PathBuf {
        let dir = self.scratch.path().join("volumes").join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create volume dir");
        dir
    }

    /// Create a HOST_PATH volume; returns `(volume_id, root_id)`
    pub async fn create_volume(&self, cookie: &str, name: &str, path: &Path) -> (Uuid, Uuid) {
        let response = self
            .request(
                "POST",
                "/ui-api/volumes/create",
                Some(json!({
                    "name": name,
                    "kind": "HOST_PATH",
                    "path": path.to_string_lossy(),
                })),
                Some(cookie),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Volume creation failed: {:?}",
            response.body
        );
        let volume_id = response.uuid("id");

        let details = self
            .request("GET", &format!("/ui-api/volumes/{volume_id}"), None, Some(cookie))
            .await;
        assert_eq!(details.status, StatusCode::OK);
        (volume_id, details.uuid("root_id"))
    }

    /// Create a folder under `parent_id` and return its id
    pub async fn new_folder(&self, cookie: &str, parent_id: Uuid, name: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                &format!("/ui-api/files/{parent_id}/new-folder"),
                Some(json!({ "name": name })),
                Some(cookie),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Folder creation failed: {:?}",
            response.body
        );
        response.uuid("id")
    }

    /// Upload one file into `folder_id` and return the id of the row it
    /// produced, whatever name the collision rules gave it
    pub async fn upload(&self, cookie: &str, folder_id: Uuid, name: &str, content: &[u8]) -> Uuid {
        let before = self.children(cookie, folder_id).await;

        let mut body = Vec::with_capacity(content.len() + 256);
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(format!("/ui-api/files/{folder_id}/upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .expect("Failed to build request");
        let response = self.send(request).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Upload failed: {:?}",
            response.body
        );

        self.children(cookie, folder_id)
            .await
            .into_iter()
            .find(|(id, _)| !before.iter().any(|(old, _)| old == id))
            .map(|(id, _)| id)
            .expect("Uploaded file not listed")
    }

    /// `(id, name)` of every child of `folder_id`
    pub async fn children(&self, cookie: &str, folder_id: Uuid) -> Vec<(Uuid, String)> {
        let response = self
            .request(
                "GET",
                &format!("/ui-api/files/{folder_id}?fields=children"),
                None,
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["children"]
            .as_array()
            .map(|children| {
                children
                    .iter()
                    .filter_map(|c| {
                        let id = c["id"].as_str()?.parse().ok()?;
                        Some((id, c["name"].as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find a child of `folder_id` by name through the API
    pub async fn child_id(&self, cookie: &str, folder_id: Uuid, name: &str) -> Option<Uuid> {
        self.children(cookie, folder_id)
            .await
            .into_iter()
            .find(|(_, child)| child == name)
            .map(|(id, _)| id)
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Bytes,
    /// Body parsed as JSON, `Null` when it is not JSON
    pub body: Value,
}

impl TestResponse {
    /// `rpidrive_session=<token>` from `Set-Cookie`, when a non-empty one is set
    pub fn session_cookie(&self) -> Option<String> {
        let prefix = format!("{SESSION_COOKIE}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&prefix) && pair.len() > prefix.len())
            .map(str::to_string)
    }

    /// A header value as a string
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A UUID field of the JSON body
    pub fn uuid(&self, field: &str) -> Uuid {
        self.body[field]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("No UUID field '{field}' in {:?}", self.body))
    }

    /// The `error` message of the JSON body
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
