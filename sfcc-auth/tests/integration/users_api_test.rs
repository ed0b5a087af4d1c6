//! ユーザー管理APIの統合テスト

use axum::http::StatusCode;
use serde_json::json;
use sfcc_auth::audit::types::ActionKind;

use crate::support::app::{spawn_app, ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::support::http::{get, login_token, post_json};

fn new_user(username: &str, email: Option<&str>) -> serde_json::Value {
    json!({
        "username": username,
        "email": email,
        "password": "member-password",
        "role": "squadron_commander"
    })
}

#[tokio::test]
async fn test_create_user_records_user_created() {
    let t = spawn_app().await;
    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, body) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &new_user("Commander", Some("CMD@Example.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "commander");
    assert_eq!(body["email"], "cmd@example.org");
    assert_eq!(body["role"], "squadron_commander");
    let id = body["id"].as_i64().unwrap();
    assert!(id > 0);

    let records = t.audit_records().await;
    let created = &records[0];
    assert_eq!(created.action, ActionKind::UserCreated);
    assert_eq!(created.actor_id, Some(0));
    assert_eq!(created.target_table.as_deref(), Some("users"));
    assert_eq!(created.target_id.as_deref(), Some(id.to_string().as_str()));
    assert!(!created.details.as_ref().unwrap().to_json().contains("member-password"));
}

#[tokio::test]
async fn test_duplicate_handles_conflict() {
    let t = spawn_app().await;
    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, _) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &new_user("jones", Some("j@x.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        post_json(&t.app, "/api/users", Some(&admin), &new_user("JONES", None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Resource conflict");

    let (status, _) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &new_user("other", Some("J@X.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_superuser_handle_is_reserved() {
    let t = spawn_app().await;
    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, _) =
        post_json(&t.app, "/api/users", Some(&admin), &new_user("Admin", None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let t = spawn_app().await;
    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, _) =
        post_json(&t.app, "/api/users", Some(&admin), &new_user("a@b.com", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &json!({ "username": "short", "password": "abc", "role": "cadet" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &json!({ "username": "x", "password": "long-enough", "role": "superadmin" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid request" }));

    let (status, body) = post_json(
        &t.app,
        "/api/users",
        Some(&admin),
        &json!({ "username": "no-password-field" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid request" }));
}

#[tokio::test]
async fn test_list_never_exposes_hashes() {
    let t = spawn_app().await;
    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    post_json(&t.app, "/api/users", Some(&admin), &new_user("jones", None)).await;

    let (status, body) = get(&t.app, "/api/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.to_string();
    assert!(!text.contains("$2b$"));
    assert!(!text.contains("password"));
}
