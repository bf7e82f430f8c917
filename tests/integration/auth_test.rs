//! Integration tests for the session flow and the login brute-force guard.

mod helpers;

use axum::http::{StatusCode, header};
use serde_json::json;

use helpers::{TestApp, unique};
use rpidrive_auth::bruteforce::BLOCKED_MESSAGE;
use rpidrive_service::user::INVALID_CREDENTIALS;

#[tokio::test]
async fn test_login_check_logout() {
    let Some(app) = TestApp::new().await else { return };
    let username = unique("z");
    app.create_user(&username, "gg!!", false).await;

    let response = app
        .request(
            "POST",
            "/ui-api/users/login",
            Some(json!({ "username": username, "password": "gg!!" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({}));
    let cookie = response.session_cookie().expect("session cookie");

    let check = app.request("GET", "/ui-api/users/check", None, Some(&cookie)).await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.body, json!({ "flag": true }));

    let logout = app.request("POST", "/ui-api/users/logout", None, Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body, json!({}));

    let check = app.request("GET", "/ui-api/users/check", None, Some(&cookie)).await;
    assert_eq!(check.status, StatusCode::FORBIDDEN);
    assert_eq!(check.body, json!({ "flag": false }));
}

#[tokio::test]
async fn test_current_user_never_exposes_hash() {
    let Some(app) = TestApp::new().await else { return };
    let username = unique("self");
    app.create_user(&username, "password123", false).await;
    let cookie = app.login(&username, "password123").await;

    let response = app.request("GET", "/ui-api/users/self", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], username.as_str());
    assert_eq!(response.body["is_superuser"], false);
    assert!(response.body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_inactive_user_cannot_log_in() {
    let Some(app) = TestApp::new().await else { return };
    let username = unique("inactive");
    let user = app.create_user(&username, "password123", false).await;
    let admin = app.admin_session().await;

    let response = app
        .request(
            "PUT",
            &format!("/ui-api/users/{}", user.id),
            Some(json!({ "is_active": false })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/ui-api/users/login",
            Some(json!({ "username": username, "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), INVALID_CREDENTIALS);
}

#[tokio::test]
async fn test_repeated_failures_block_the_address() {
    let Some(app) = TestApp::new().await else { return };
    let username = unique("victim");
    app.create_user(&username, "right-password", false).await;
    let wrong = json!({ "username": username, "password": "wrong" });

    for _ in 0..5 {
        let response = app
            .request("POST", "/ui-api/users/login", Some(wrong.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, json!({ "error": INVALID_CREDENTIALS }));
    }

    for _ in 0..2 {
        let response = app
            .request("POST", "/ui-api/users/login", Some(wrong.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body, json!({ "error": BLOCKED_MESSAGE }));
    }

    // Blocked even with the right password.
    let response = app
        .request(
            "POST",
            "/ui-api/users/login",
            Some(json!({ "username": username, "password": "right-password" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert!(app.state.guard.reset_all().await.unwrap() >= 1);
    app.login(&username, "right-password").await;
}

#[tokio::test]
async fn test_success_clears_failure_counter() {
    let Some(app) = TestApp::with_config(|c| c.security.block_trigger = 3).await else {
        return;
    };
    let username = unique("forgetful");
    app.create_user(&username, "right-password", false).await;
    let wrong = json!({ "username": username, "password": "wrong" });

    for _ in 0..2 {
        app.request("POST", "/ui-api/users/login", Some(wrong.clone()), None)
            .await;
    }
    app.login(&username, "right-password").await;

    for _ in 0..2 {
        let response = app
            .request("POST", "/ui-api/users/login", Some(wrong.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_html_request_without_session_redirects_to_login() {
    let Some(app) = TestApp::new().await else { return };

    let request = axum::http::Request::builder()
        .uri("/ui-api/volumes")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.header(header::LOCATION),
        Some("/login?next=/ui-api/volumes")
    );

    let response = app.request("GET", "/ui-api/volumes", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
