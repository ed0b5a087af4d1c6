//! データベース未設定・監査ログ障害時の統合テスト

use async_trait::async_trait;
use axum::http::StatusCode;
use sfcc_auth::api;
use sfcc_auth::audit::types::{AuditLogFilter, AuditRecord, NewAuditRecord};
use sfcc_auth::audit::AuditLogger;
use sfcc_auth::auth::access::AccessController;
use sfcc_auth::auth::login::LoginService;
use sfcc_auth::common::auth::Role;
use sfcc_auth::common::error::LbError;
use sfcc_auth::db::traits::AuditLogRepository;
use sfcc_auth::AppState;
use std::sync::Arc;

use crate::support::app::{spawn_app, spawn_app_without_db, ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::support::http::{get, login, login_token};

struct BrokenSink;

#[async_trait]
impl AuditLogRepository for BrokenSink {
    async fn append(&self, _record: &NewAuditRecord) -> Result<i64, LbError> {
        Err(LbError::Database("database is locked".to_string()))
    }

    async fn query(&self, _filter: &AuditLogFilter) -> Result<Vec<AuditRecord>, LbError> {
        Err(LbError::Database("database is locked".to_string()))
    }

    async fn count(&self, _filter: &AuditLogFilter) -> Result<i64, LbError> {
        Err(LbError::Database("database is locked".to_string()))
    }
}

fn with_broken_audit(mut state: AppState) -> AppState {
    state.audit = AuditLogger::new(Arc::new(BrokenSink));
    state.login = LoginService::new(
        state.credentials.clone(),
        state.tokens.clone(),
        state.audit.clone(),
    );
    state.access = AccessController::new(state.tokens.clone(), state.audit.clone());
    state
}

#[tokio::test]
async fn test_superuser_works_without_database() {
    let t = spawn_app_without_db().await;

    let token = login_token(&t.app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let (status, me) = get(&t.app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");

    let (status, body) = get(&t.app, "/api/users", Some(&token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service temporarily unavailable");

    let (status, health) = get(&t.app, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["database"], "not configured");
    assert_eq!(health["audit"]["durable"], false);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_audit_failure_does_not_block_login_or_denial() {
    let t = spawn_app().await;
    t.create_user("cadet1", None, "cadet-password", Role::Cadet)
        .await;
    let state = with_broken_audit(t.state.clone());
    let app = api::create_app(state.clone());

    let admin = login_token(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let cadet = login_token(&app, "cadet1", "cadet-password").await;

    let (status, _) = get(&app, "/api/users", Some(&cadet)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = login(&app, ADMIN_USERNAME, "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(state.audit.sink_failures(), 4);

    let (status, health) = get(&app, "/api/health", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["audit"]["sink_failures"], 4);
}

#[tokio::test]
async fn test_health_and_root() {
    let t = spawn_app().await;

    let (status, health) = get(&t.app, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "connected");
    assert_eq!(health["audit"]["durable"], true);
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let (status, root) = get(&t.app, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["service"], "SFCC Command Suite API");
}
