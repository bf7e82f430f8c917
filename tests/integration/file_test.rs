//! Integration tests for uploads, folder operations and range downloads.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use uuid::Uuid;

use helpers::{TestApp, TestResponse, unique};

const SIZE: usize = 10_000;

fn content() -> Vec<u8> {
    (0..SIZE).map(|i| (i % 251) as u8).collect()
}

async fn get_range(app: &TestApp, cookie: &str, id: Uuid, range: Option<&str>) -> TestResponse {
    let mut request = Request::builder()
        .uri(format!("/download/{id}"))
        .header(header::COOKIE, cookie);
    if let Some(range) = range {
        request = request.header(header::RANGE, range);
    }
    app.send(request.body(Body::empty()).unwrap()).await
}

/// Admin session, a fresh volume and the uploaded 10 000-byte file.
async fn uploaded(app: &TestApp) -> (String, Uuid, Uuid) {
    let admin = app.admin_session().await;
    let name = unique("files");
    let dir = app.volume_dir(&name);
    let (_, root) = app.create_volume(&admin, &name, &dir).await;
    let id = app.upload(&admin, root, "blob.bin", &content()).await;

    let on_disk = std::fs::read(dir.join("blob.bin")).unwrap();
    assert_eq!(on_disk, content());
    (admin, root, id)
}

#[tokio::test]
async fn test_range_download() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, _, id) = uploaded(&app).await;

    let response = get_range(&app, &admin, id, Some("bytes=0-99")).await;
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), Some("bytes 0-99/10000"));
    assert_eq!(response.header(header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(response.bytes.len(), 100);
    assert_eq!(&response.bytes[..], &content()[..100]);

    let response = get_range(&app, &admin, id, Some("bytes=9990-")).await;
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.bytes.len(), 10);
    assert_eq!(&response.bytes[..], &content()[9990..]);
}

#[tokio::test]
async fn test_full_download_and_partition_reassembly() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, _, id) = uploaded(&app).await;

    let response = get_range(&app, &admin, id, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_LENGTH), Some("10000"));
    assert_eq!(&response.bytes[..], &content()[..]);

    let mut joined = Vec::with_capacity(SIZE);
    for range in ["bytes=0-4095", "bytes=4096-8191", "bytes=8192-"] {
        let part = get_range(&app, &admin, id, Some(range)).await;
        assert_eq!(part.status, StatusCode::PARTIAL_CONTENT);
        joined.extend_from_slice(&part.bytes);
    }
    assert_eq!(joined, content());

    let response = get_range(&app, &admin, id, Some("bytes=10000-")).await;
    assert_eq!(response.status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.header(header::CONTENT_RANGE), Some("bytes */10000"));
}

#[tokio::test]
async fn test_upload_name_collision_gets_unique_name() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, root, first) = uploaded(&app).await;

    let second = app.upload(&admin, root, "blob.bin", b"second").await;
    assert_ne!(first, second);

    let response = app
        .request("GET", &format!("/ui-api/files/{second}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "blob (1).bin");
    assert_eq!(response.body["size"], 6);
}

#[tokio::test]
async fn test_folder_rename_and_move() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, root, file) = uploaded(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{root}/new-folder"),
            Some(json!({ "name": "docs" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let docs = response.uuid("id");

    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{file}/rename"),
            Some(json!({ "name": "renamed.bin" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/ui-api/files/move",
            Some(json!({ "files": [file], "move_to": docs, "strategy": "rename" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let response = app
        .request(
            "GET",
            &format!("/ui-api/files/{file}?fields=path,parent"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.body["name"], "renamed.bin");
    assert_eq!(response.body["parent"]["id"], docs.to_string());
    let path = response.body["path"].as_array().unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0]["id"], root.to_string());

    // Moving a folder into itself is refused.
    let response = app
        .request(
            "POST",
            "/ui-api/files/move",
            Some(json!({ "files": [docs], "move_to": docs })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, root, _) = uploaded(&app).await;

    for name in ["", "a/b", ".."] {
        let response = app
            .request(
                "POST",
                &format!("/ui-api/files/{root}/new-folder"),
                Some(json!({ "name": name })),
                Some(&admin),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "name {name:?}");
    }
}

#[tokio::test]
async fn test_search_and_delete() {
    let Some(app) = TestApp::new().await else { return };
    let (admin, _, file) = uploaded(&app).await;

    let response = app.request("GET", "/ui-api/files/search", None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Keyword is required");

    let response = app
        .request("GET", "/ui-api/files/search?keyword=BLOB", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response.body["values"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f["id"] == file.to_string())
    );

    let response = app
        .request("DELETE", &format!("/ui-api/files/{file}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = get_range(&app, &admin, file, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

async fn move_files(app: &TestApp, cookie: &str, files: &[Uuid], to: Uuid, strategy: &str) -> TestResponse {
    app.request(
        "POST",
        "/ui-api/files/move",
        Some(json!({ "files": files, "move_to": to, "strategy": strategy })),
        Some(cookie),
    )
    .await
}

#[tokio::test]
async fn test_move_strategies_on_name_clash() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("clash");
    let dir = app.volume_dir(&name);
    let (_, root) = app.create_volume(&admin, &name, &dir).await;

    let original = app.upload(&admin, root, "song.mp3", b"original").await;
    let incoming = app.new_folder(&admin, root, "incoming").await;
    let renamed = app.upload(&admin, incoming, "song.mp3", b"renamed").await;
    let replacing = app.upload(&admin, incoming, "other.mp3", b"x").await;

    // rename keeps both
    let response = move_files(&app, &admin, &[renamed], root, "rename").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(std::fs::read(dir.join("song.mp3")).unwrap(), b"original");
    assert_eq!(std::fs::read(dir.join("song (1).mp3")).unwrap(), b"renamed");
    assert_eq!(app.child_id(&admin, root, "song (1).mp3").await, Some(renamed));

    // overwrite replaces the row and the bytes
    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{replacing}/rename"),
            Some(json!({ "name": "song.mp3" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let response = move_files(&app, &admin, &[replacing], root, "overwrite").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    assert_eq!(std::fs::read(dir.join("song.mp3")).unwrap(), b"x");
    assert!(!dir.join("incoming/song.mp3").exists());
    assert_eq!(app.child_id(&admin, root, "song.mp3").await, Some(replacing));
    let response = app
        .request("GET", &format!("/ui-api/files/{original}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overwrite_refuses_folder_holding_the_source() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("nested");
    let dir = app.volume_dir(&name);
    let (_, root) = app.create_volume(&admin, &name, &dir).await;

    let outer = app.new_folder(&admin, root, "X").await;
    let sub = app.new_folder(&admin, outer, "sub").await;
    let inner = app.upload(&admin, sub, "X", b"keep me").await;

    let response = move_files(&app, &admin, &[inner], root, "overwrite").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{:?}", response.body);

    assert_eq!(std::fs::read(dir.join("X/sub/X")).unwrap(), b"keep me");
    let response = get_range(&app, &admin, inner, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.bytes[..], b"keep me");
}
