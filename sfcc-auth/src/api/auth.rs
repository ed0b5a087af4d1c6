//! 認証API
//!
//! ログイン、認証情報確認

use super::error::AppError;
use crate::common::auth::{Claims, Role};
use crate::common::ip::resolve_origin;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// ログインリクエスト
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// ユーザー名またはメールアドレス
    #[serde(default)]
    pub username: String,
    /// パスワード
    #[serde(default)]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// JWTトークン
    pub token: String,
    /// トークン有効期限（秒）
    pub expires_in: i64,
    /// ユーザー情報
    pub user: UserInfo,
}

/// ユーザー情報（ログインレスポンス用）
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// ユーザー名
    pub username: String,
    /// ロール
    pub role: Role,
}

/// 認証情報レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// アイデンティティID
    pub user_id: i64,
    /// ユーザー名
    pub username: String,
    /// ロール
    pub role: Role,
    /// トークン有効期限
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/auth/login - ログイン
///
/// 本文が不正な場合も空の認証情報として扱い、ログイン失敗として記録する。
///
/// # Returns
/// * `200 OK` - ログイン成功（JWT token）
/// * `401 Unauthorized` - 認証失敗（理由は区別しない）
pub async fn login(
    State(app_state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Malformed login request: {}", rejection);
            LoginRequest::default()
        }
    };
    let origin = resolve_origin(
        &headers,
        connect_info.as_ref().map(|ConnectInfo(addr)| addr),
        app_state.config.trust_proxy_headers,
    );

    let issued = app_state
        .login
        .authenticate(&request.username, &request.password, origin)
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        user: UserInfo {
            username: issued.claims.username,
            role: issued.claims.role,
        },
    }))
}

/// GET /api/auth/me - 認証済みトークンの情報
pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.user_id,
        username: claims.username,
        role: claims.role,
        expires_at: DateTime::from_timestamp(claims.exp as i64, 0),
    })
}
