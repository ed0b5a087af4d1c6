//! アクセス制御E2Eテスト
//!
//! 401系は監査しない、403は必ず1件監査する

use axum::http::StatusCode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use serde_json::json;
use sfcc_auth::audit::types::ActionKind;
use sfcc_auth::common::auth::Role;

use crate::support::app::{spawn_app, ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::support::http::{get, get_with_authorization, login_token};

#[tokio::test]
async fn test_cadet_on_admin_route_is_denied_and_audited_once() {
    let t = spawn_app().await;
    let cadet = t
        .create_user("cadet1", None, "cadet-password", Role::Cadet)
        .await;
    let token = login_token(&t.app, "cadet1", "cadet-password").await;
    let before = t.audit_records().await.len();

    let (status, body) = get(&t.app, "/api/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Insufficient permissions" }));

    let records = t.audit_records().await;
    assert_eq!(records.len(), before + 1);
    let denied = &records[0];
    assert_eq!(denied.action, ActionKind::AccessDenied);
    assert_eq!(denied.actor_id, Some(cadet.id));
    assert_eq!(denied.ip_address.as_deref(), Some("198.51.100.20"));
    let details = denied.details.as_ref().unwrap();
    assert_eq!(details.get("endpoint"), Some(&json!("GET /api/users")));
    assert_eq!(details.get("required_roles"), Some(&json!(["admin"])));
    assert_eq!(details.get("role"), Some(&json!("cadet")));
}

#[tokio::test]
async fn test_missing_token_is_401_without_audit() {
    let t = spawn_app().await;

    let (status, body) = get(&t.app, "/api/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "No token provided" }));

    let (status, body) = get_with_authorization(&t.app, "/api/users", "Bearer ").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");

    assert!(t.audit_records().await.is_empty());
}

#[tokio::test]
async fn test_expired_token_is_401_without_audit() {
    let t = spawn_app().await;
    let admin = t
        .state
        .credentials
        .resolve(ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap();
    let expired = t
        .state
        .tokens
        .issue_at(&admin, Utc::now() - Duration::hours(25))
        .unwrap()
        .token;

    let (status, body) = get(&t.app, "/api/users", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid or expired token" }));
    assert!(t.audit_records().await.is_empty());
}

#[tokio::test]
async fn test_tampered_role_claim_is_rejected() {
    let t = spawn_app().await;
    t.create_user("cadet1", None, "cadet-password", Role::Cadet)
        .await;
    let token = login_token(&t.app, "cadet1", "cadet-password").await;
    let before = t.audit_records().await.len();

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let mut payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
    payload["role"] = json!("admin");
    parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let forged = parts.join(".");

    let (status, body) = get(&t.app, "/api/users", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
    assert_eq!(t.audit_records().await.len(), before);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_invalid() {
    let t = spawn_app().await;
    let (status, body) =
        get_with_authorization(&t.app, "/api/users", "Basic YWRtaW46cm9vdA==").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_audit_log_route_roles() {
    let t = spawn_app().await;
    t.create_user("auditor", None, "auditor-password", Role::ExternalAuditor)
        .await;
    t.create_user("cfo", None, "cfo-password", Role::CfoTreasurer)
        .await;

    let admin = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let auditor = login_token(&t.app, "auditor", "auditor-password").await;
    let cfo = login_token(&t.app, "cfo", "cfo-password").await;

    assert_eq!(get(&t.app, "/api/audit-logs", Some(&admin)).await.0, StatusCode::OK);
    assert_eq!(get(&t.app, "/api/audit-logs", Some(&auditor)).await.0, StatusCode::OK);
    assert_eq!(
        get(&t.app, "/api/audit-logs", Some(&cfo)).await.0,
        StatusCode::FORBIDDEN
    );
    // 外部監査人もユーザー管理はできない
    assert_eq!(
        get(&t.app, "/api/users", Some(&auditor)).await.0,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_me_accepts_every_role() {
    let t = spawn_app().await;
    for (i, role) in Role::ALL.into_iter().enumerate() {
        let username = format!("user{}", i);
        t.create_user(&username, None, "member-password", role).await;
        let token = login_token(&t.app, &username, "member-password").await;
        let (status, me) = get(&t.app, "/api/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["role"], role.as_str());
    }
}
