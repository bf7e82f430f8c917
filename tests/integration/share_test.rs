//! Integration tests for public links and their expiry.

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use helpers::{TestApp, TestResponse, unique};
use rpidrive_database::repositories::share::ShareRepository;
use rpidrive_worker::LinkCleanup;

async fn quick_access(app: &TestApp, key: &str) -> TestResponse {
    let request = Request::builder()
        .uri(format!("/quick-access?key={key}"))
        .body(Body::empty())
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn test_link_serves_file_until_cleanup() {
    let Some(app) = TestApp::with_config(|c| c.web.public_link_expiry = 60).await else {
        return;
    };
    let admin = app.admin_session().await;
    let name = unique("shared");
    let (_, root) = app.create_volume(&admin, &name, &app.volume_dir(&name)).await;
    let file = app.upload(&admin, root, "song.mp3", b"not really audio").await;

    let response = app
        .request("POST", &format!("/ui-api/files/{file}/share"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let link = response.uuid("id");

    // No session needed.
    let response = quick_access(&app, &link.to_string()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.bytes[..], b"not really audio");

    let shares = Arc::new(ShareRepository::new(app.db_pool.clone()));
    let cleanup = LinkCleanup::new(Arc::clone(&shares));

    assert_eq!(cleanup.run(Utc::now()).await.unwrap(), 0);
    assert!(shares.find_by_id(link).await.unwrap().is_some());

    let removed = cleanup.run(Utc::now() + Duration::seconds(61)).await.unwrap();
    assert!(removed >= 1);
    assert!(shares.find_by_id(link).await.unwrap().is_none());

    let response = quick_access(&app, &link.to_string()).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_keys_are_not_found() {
    let Some(app) = TestApp::new().await else { return };

    for key in ["", "not-a-uuid", &uuid::Uuid::new_v4().to_string()] {
        let response = quick_access(&app, key).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "key {key:?}");
    }

    let request = Request::builder()
        .uri("/quick-access")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folders_cannot_be_shared() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("folders");
    let (_, root) = app.create_volume(&admin, &name, &app.volume_dir(&name)).await;

    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{root}/new-folder"),
            Some(json!({ "name": "album" })),
            Some(&admin),
        )
        .await;
    let folder = response.uuid("id");

    let response = app
        .request("POST", &format!("/ui-api/files/{folder}/share"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
