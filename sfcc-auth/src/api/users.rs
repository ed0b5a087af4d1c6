//! ユーザー管理API
//!
//! Admin専用の永続化ユーザー一覧・作成

use super::error::AppError;
use crate::audit::types::{ActionKind, AuditDetails, NewAuditRecord};
use crate::common::auth::{normalize_handle, Claims, Identity, Role};
use crate::common::error::{CommonError, LbError};
use crate::common::ip::resolve_origin;
use crate::db::traits::IdentityRepository;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// パスワードの最小文字数
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// ユーザー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// ユーザー名
    pub username: String,
    /// メールアドレス（任意）
    pub email: Option<String>,
    /// 初期パスワード
    pub password: String,
    /// ロール
    pub role: Role,
}

/// ユーザーレスポンス（password_hash除外）
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// ユーザーID
    pub id: i64,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: Option<String>,
    /// ロール
    pub role: Role,
}

/// ユーザー一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// ユーザー一覧
    pub users: Vec<UserResponse>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        UserResponse {
            id: identity.id,
            username: identity.handle,
            email: identity.email,
            role: identity.role,
        }
    }
}

fn repository(app_state: &AppState) -> Result<&Arc<dyn IdentityRepository>, AppError> {
    app_state.users.as_ref().ok_or_else(|| {
        AppError(LbError::ServiceUnavailable(
            "User management requires a database".to_string(),
        ))
    })
}

fn validation(message: &str) -> AppError {
    AppError(LbError::Common(CommonError::Validation(message.to_string())))
}

fn validate(request: &CreateUserRequest, superuser: Option<&str>) -> Result<(), AppError> {
    let username = normalize_handle(&request.username);
    if username.is_empty() {
        return Err(validation("username must not be empty"));
    }
    if username.contains('@') {
        return Err(validation("username must not contain '@'"));
    }
    if let Some(email) = request.email.as_deref().map(normalize_handle) {
        if !email.is_empty() && !email.contains('@') {
            return Err(validation("email must contain '@'"));
        }
        if superuser == Some(email.as_str()) {
            return Err(AppError(LbError::Conflict(
                "handle is reserved".to_string(),
            )));
        }
    }
    if superuser == Some(username.as_str()) {
        return Err(AppError(LbError::Conflict("handle is reserved".to_string())));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(validation("password is too short"));
    }
    Ok(())
}

/// GET /api/users - ユーザー一覧取得
///
/// # Returns
/// * `200 OK` - ユーザー一覧（password_hash除外）
/// * `503 Service Unavailable` - データベース未設定
pub async fn list(State(app_state): State<AppState>) -> Result<Json<ListUsersResponse>, AppError> {
    let identities = repository(&app_state)?.list_identities().await?;

    Ok(Json(ListUsersResponse {
        users: identities.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/users - ユーザー作成
///
/// 作成に成功すると`USER_CREATED`を記録する。
///
/// # Returns
/// * `201 Created` - 作成されたユーザー
/// * `400 Bad Request` - 入力不正
/// * `409 Conflict` - ハンドルの重複
/// * `503 Service Unavailable` - データベース未設定
pub async fn create(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let repository = repository(&app_state)?;
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Malformed create user request: {}", rejection);
        validation("malformed request body")
    })?;
    validate(&request, app_state.credentials.superuser_handle())?;

    let cost = app_state.config.bcrypt_cost;
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || {
        crate::auth::password::hash_password_with_cost(&password, cost)
    })
    .await
    .map_err(|e| AppError(LbError::Internal(format!("Hashing task failed: {}", e))))??;

    let identity = repository
        .create_identity(
            &request.username,
            request.email.as_deref(),
            &password_hash,
            request.role,
        )
        .await?;

    let origin = resolve_origin(
        &headers,
        connect_info.as_ref().map(|ConnectInfo(addr)| addr),
        app_state.config.trust_proxy_headers,
    );
    app_state
        .audit
        .record_best_effort(
            NewAuditRecord::new(ActionKind::UserCreated)
                .actor(Some(claims.user_id))
                .target("users", Some(identity.id.to_string()))
                .details(
                    AuditDetails::new()
                        .with("username", identity.handle.as_str())
                        .with("role", identity.role.as_str()),
                )
                .origin(origin),
        )
        .await;

    tracing::info!(
        user_id = identity.id,
        role = %identity.role,
        created_by = claims.user_id,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(identity))))
}
