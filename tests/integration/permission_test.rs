//! Integration tests for volume permission enforcement.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use helpers::{TestApp, unique};

/// Admin session plus two volumes, with `user` granted READ on the first.
struct Fixture {
    admin: String,
    user: String,
    v1: (Uuid, Uuid),
    v2: (Uuid, Uuid),
}

async fn fixture(app: &TestApp) -> Fixture {
    let admin = app.admin_session().await;
    let v1_name = unique("v1");
    let v2_name = unique("v2");
    let v1 = app
        .create_volume(&admin, &v1_name, &app.volume_dir(&v1_name))
        .await;
    let v2 = app
        .create_volume(&admin, &v2_name, &app.volume_dir(&v2_name))
        .await;

    let username = unique("u");
    let user = app.create_user(&username, "password123", false).await;
    let response = app
        .request(
            "PUT",
            &format!("/ui-api/volumes/{}", v1.0),
            Some(json!({ "users": [{ "user": user.id, "permission": 10 }] })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let user = app.login(&username, "password123").await;
    Fixture { admin, user, v1, v2 }
}

#[tokio::test]
async fn test_user_sees_only_granted_volumes() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app.request("GET", "/ui-api/volumes", None, Some(&f.user)).await;
    assert_eq!(response.status, StatusCode::OK);
    let values = response.body["values"].as_array().unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["id"], f.v1.0.to_string());

    let response = app.request("GET", "/ui-api/volumes", None, Some(&f.admin)).await;
    let ids: Vec<&str> = response.body["values"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["id"].as_str())
        .collect();
    assert!(ids.contains(&f.v1.0.to_string().as_str()));
    assert!(ids.contains(&f.v2.0.to_string().as_str()));
}

#[tokio::test]
async fn test_invisible_volume_is_not_found() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app
        .request("GET", &format!("/ui-api/files/{}", f.v2.1), None, Some(&f.user))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("GET", &format!("/ui-api/volumes/{}", f.v2.0), None, Some(&f.user))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("GET", &format!("/ui-api/files/{}", f.v1.1), None, Some(&f.user))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_read_permission_cannot_write() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{}/new-folder", f.v1.1),
            Some(json!({ "name": "x" })),
            Some(&f.user),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "POST",
            &format!("/ui-api/files/{}/new-folder", f.v1.1),
            Some(json!({ "name": "x" })),
            Some(&f.admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_volume_details_report_effective_permission() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app
        .request("GET", &format!("/ui-api/volumes/{}", f.v1.0), None, Some(&f.user))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["permission"], 10);
    assert!(response.body.get("users").is_none());

    let response = app
        .request("GET", &format!("/ui-api/volumes/{}", f.v1.0), None, Some(&f.admin))
        .await;
    assert_eq!(response.body["permission"], 30);
    assert_eq!(response.body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_only_endpoints_reject_regular_users() {
    let Some(app) = TestApp::new().await else { return };
    let f = fixture(&app).await;

    let response = app.request("GET", "/ui-api/users", None, Some(&f.user)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let name = unique("sneaky");
    let response = app
        .request(
            "POST",
            "/ui-api/volumes/create",
            Some(json!({
                "name": name,
                "kind": "HOST_PATH",
                "path": app.volume_dir(&name).to_string_lossy(),
            })),
            Some(&f.user),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("POST", &format!("/ui-api/volumes/{}/index", f.v1.0), None, Some(&f.user))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
