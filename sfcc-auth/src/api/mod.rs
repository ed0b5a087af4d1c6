//! REST APIハンドラー

/// 認証API（ログイン・自身の情報）
pub mod auth;

/// 監査ログ閲覧API
pub mod audit_log;

/// APIエラーレスポンス型
pub mod error;

/// システム情報API（ヘルスチェック）
pub mod system;

/// ユーザー管理API
pub mod users;

use crate::auth::middleware::{require_roles, RoleGuard};
use crate::common::auth::{Role, RoleSet};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// 監査ログを閲覧できるロール
pub fn audit_log_readers() -> RoleSet {
    RoleSet::new([Role::Admin, Role::ExternalAuditor])
        .unwrap_or_else(|_| RoleSet::only(Role::Admin))
}

fn guarded(state: &AppState, required: RoleSet) -> RoleGuard {
    RoleGuard::new(state.clone(), required)
}

/// APIルーターを構築
pub fn create_app(state: AppState) -> Router {
    let me_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            guarded(&state, RoleSet::any()),
            require_roles,
        ));

    let user_routes = Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route_layer(middleware::from_fn_with_state(
            guarded(&state, RoleSet::only(Role::Admin)),
            require_roles,
        ));

    let audit_routes = Router::new()
        .route("/api/audit-logs", get(audit_log::list))
        .route_layer(middleware::from_fn_with_state(
            guarded(&state, audit_log_readers()),
            require_roles,
        ));

    Router::new()
        .route("/", get(system::root))
        .route("/api/health", get(system::health))
        .route("/api/auth/login", post(auth::login))
        .merge(me_routes)
        .merge(user_routes)
        .merge(audit_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
