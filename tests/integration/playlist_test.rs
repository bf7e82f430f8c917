//! Integration tests for playlists: ownership, actions and visibility.

mod helpers;

use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use helpers::{TestApp, TestResponse, unique};

struct Fixture {
    admin: String,
    listener: String,
    listener_id: i32,
    library: Uuid,
    tracks: [Uuid; 2],
    hidden_track: Uuid,
    playlist: i64,
}

async fn grant(app: &TestApp, admin: &str, volume_id: Uuid, members: Value) {
    let response = app
        .request(
            "PUT",
            &format!("/ui-api/volumes/{volume_id}"),
            Some(json!({ "users": members })),
            Some(admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

async fn act(app: &TestApp, cookie: &str, playlist: i64, action: Value) -> TestResponse {
    app.request("POST", &format!("/ui-api/playlists/{playlist}"), Some(action), Some(cookie))
        .await
}

async fn track_ids(app: &TestApp, cookie: &str, playlist: i64) -> Vec<String> {
    let response = app
        .request("GET", &format!("/ui-api/playlists/{playlist}"), None, Some(cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    response.body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect()
}

/// A listener with READ on a music volume and an empty playlist, plus a
/// second volume the listener cannot see.
async fn fixture(app: &TestApp) -> Fixture {
    let admin = app.admin_session().await;

    let music = unique("music");
    let (library, music_root) = app
        .create_volume(&admin, &music, &app.volume_dir(&music))
        .await;
    let first = app.upload(&admin, music_root, "one.mp3", b"first").await;
    let second = app.upload(&admin, music_root, "two.mp3", b"second").await;

    let private = unique("private");
    let (_, private_root) = app
        .create_volume(&admin, &private, &app.volume_dir(&private))
        .await;
    let hidden_track = app.upload(&admin, private_root, "secret.mp3", b"s").await;

    let username = unique("listener");
    let user = app.create_user(&username, "listener-password", false).await;
    grant(app, &admin, library, json!([{ "user": user.id, "permission": 10 }])).await;
    let listener = app.login(&username, "listener-password").await;

    let response = app
        .request(
            "POST",
            "/ui-api/playlists/create",
            Some(json!({ "name": "Road trip" })),
            Some(&listener),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["name"], "Road trip");
    let playlist = response.body["id"].as_i64().unwrap();

    Fixture {
        admin,
        listener,
        listener_id: user.id,
        library,
        tracks: [first, second],
        hidden_track,
        playlist,
    }
}

#[tokio::test]
async fn test_add_reorder_and_remove() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;
    let [first, second] = f.tracks;

    for track in [first, second] {
        let response = act(&app, &f.listener, f.playlist, json!({ "action": "add-file", "file": track })).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    }
    assert_eq!(
        track_ids(&app, &f.listener, f.playlist).await,
        [first.to_string(), second.to_string()]
    );

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "add-file", "file": first })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = act(
        &app,
        &f.listener,
        f.playlist,
        json!({ "action": "add-file", "file": f.hidden_track }),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "reorder", "files": [second, first] })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        track_ids(&app, &f.listener, f.playlist).await,
        [second.to_string(), first.to_string()]
    );

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "reorder", "files": [second] })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "rename", "name": "Commute" })).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "remove-file", "file": second })).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app
        .request("GET", &format!("/ui-api/playlists/{}", f.playlist), None, Some(&f.listener))
        .await;
    assert_eq!(response.body["name"], "Commute");
    assert_eq!(response.body["files"].as_array().unwrap().len(), 1);

    let response = app
        .request("DELETE", &format!("/ui-api/playlists/{}", f.playlist), None, Some(&f.listener))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app
        .request("GET", &format!("/ui-api/playlists/{}", f.playlist), None, Some(&f.listener))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_playlist_is_private_to_owner() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app
        .request("GET", &format!("/ui-api/playlists/{}", f.playlist), None, Some(&f.admin))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("GET", "/ui-api/playlists", None, Some(&f.admin)).await;
    assert!(
        response.body["values"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["id"] != f.playlist)
    );
}

#[tokio::test]
async fn test_lost_access_hides_tracks_and_reorder_follows() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;
    let [first, second] = f.tracks;
    for track in [first, second] {
        let response = act(&app, &f.listener, f.playlist, json!({ "action": "add-file", "file": track })).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // access to the music volume is withdrawn
    grant(&app, &f.admin, f.library, json!([])).await;
    assert!(track_ids(&app, &f.listener, f.playlist).await.is_empty());

    let response = act(&app, &f.listener, f.playlist, json!({ "action": "reorder", "files": [] })).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let response = act(&app, &f.listener, f.playlist, json!({ "action": "reorder", "files": [second, first] })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // restored access shows the tracks again, in their original order
    grant(&app, &f.admin, f.library, json!([{ "user": f.listener_id, "permission": 10 }])).await;
    assert_eq!(
        track_ids(&app, &f.listener, f.playlist).await,
        [first.to_string(), second.to_string()]
    );
}
