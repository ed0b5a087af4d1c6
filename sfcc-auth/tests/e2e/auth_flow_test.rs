//! 認証フローE2Eテスト
//!
//! ログイン → 保護されたAPI呼び出し → 監査ログ確認

use axum::http::StatusCode;
use serde_json::json;
use sfcc_auth::audit::types::ActionKind;
use sfcc_auth::common::auth::{Role, SUPERUSER_ID};

use crate::support::app::{spawn_app, ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::support::http::{get, login, login_token, post_json};

#[tokio::test]
async fn test_superuser_login_issues_24h_admin_token() {
    let t = spawn_app().await;

    let (status, body) = login(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 24 * 3600);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body.get("password_hash").is_none());

    let claims = t
        .state
        .tokens
        .validate(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id, SUPERUSER_ID);
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 24 * 3600);

    let records = t.audit_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, ActionKind::LoginSuccess);
    assert_eq!(records[0].actor_id, Some(SUPERUSER_ID));
    assert_eq!(records[0].target_table.as_deref(), Some("auth"));
    assert_eq!(records[0].ip_address.as_deref(), Some("198.51.100.20"));
}

#[tokio::test]
async fn test_persisted_user_logs_in_by_email_with_8h_token() {
    let t = spawn_app().await;
    let user = t
        .create_user("jones", Some("a@b.com"), "cadet-password", Role::Cadet)
        .await;

    let (status, body) = login(&t.app, "A@B.com", "cadet-password").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 8 * 3600);
    assert_eq!(body["user"]["role"], "cadet");

    let claims = t
        .state
        .tokens
        .validate(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.exp - claims.iat, 8 * 3600);

    let records = t.audit_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].actor_id, Some(user.id));
}

#[tokio::test]
async fn test_unknown_handle_and_wrong_password_are_indistinguishable() {
    let t = spawn_app().await;

    let (unknown_status, unknown_body) = login(&t.app, "nobody", "whatever").await;
    let (wrong_status, wrong_body) = login(&t.app, ADMIN_USERNAME, "not-the-password").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body, json!({ "error": "Invalid credentials" }));

    let records = t.audit_records().await;
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|record| record.action == ActionKind::LoginFailed));
}

#[tokio::test]
async fn test_failed_login_details_never_contain_password() {
    let t = spawn_app().await;
    let _ = login(&t.app, ADMIN_USERNAME, "s3cr3t-attempt").await;

    let records = t.audit_records().await;
    let details = records[0].details.as_ref().unwrap().to_json();
    assert!(details.contains("admin"));
    assert!(!details.contains("s3cr3t-attempt"));
}

#[tokio::test]
async fn test_malformed_login_body_is_a_failed_attempt() {
    let t = spawn_app().await;

    let (status, body) = post_json(&t.app, "/api/auth/login", None, &json!({ "user": 1 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let records = t.audit_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, ActionKind::LoginFailed);
    assert_eq!(records[0].actor_id, None);
}

#[tokio::test]
async fn test_complete_auth_flow() {
    let t = spawn_app().await;
    let token = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, me) = get(&t.app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user_id"], 0);
    assert_eq!(me["role"], "admin");

    let (status, created) = post_json(
        &t.app,
        "/api/users",
        Some(&token),
        &json!({
            "username": "Reviewer1",
            "email": "reviewer@example.org",
            "password": "reviewer-password",
            "role": "reviewer_instructor"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["username"], "reviewer1");
    assert!(created.get("password_hash").is_none());

    let (status, users) = get(&t.app, "/api/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["users"].as_array().unwrap().len(), 1);

    let reviewer_token = login_token(&t.app, "reviewer@example.org", "reviewer-password").await;
    let (status, me) = get(&t.app, "/api/auth/me", Some(&reviewer_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "reviewer_instructor");

    let actions: Vec<ActionKind> = t
        .audit_records()
        .await
        .into_iter()
        .rev()
        .map(|record| record.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            ActionKind::LoginSuccess,
            ActionKind::UserCreated,
            ActionKind::LoginSuccess
        ]
    );
}
