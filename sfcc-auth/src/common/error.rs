//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! # 外部向けメッセージ
//!
//! `LbError`と`AuthError`は`external_message()`と`status_code()`を提供する。
//! HTTPレスポンスには`external_message()`のみを返し、詳細（`Display`）は
//! サーバーログにだけ出力する。

use axum::http::StatusCode;
use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// 認証・認可の失敗分類
///
/// 401系（`NoToken` / `InvalidToken` / `ExpiredToken` / `InvalidCredentials`）は
/// 認証前の失敗、`RoleDenied`は認可の失敗。
/// `AuditSinkUnavailable`は呼び出し元に返さず、運用ログへ報告するだけ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Authorizationヘッダーなし、またはトークンが空
    #[error("no bearer token presented")]
    NoToken,

    /// 署名不一致・構造不正・未署名トークン
    #[error("token signature or structure is invalid")]
    InvalidToken,

    /// 署名は正しいが有効期限切れ
    #[error("token has expired")]
    ExpiredToken,

    /// ロールが要求ロール集合に含まれない
    #[error("role is not permitted for this operation")]
    RoleDenied,

    /// ログイン失敗（未知のハンドル・パスワード不一致を区別しない）
    #[error("invalid credentials")]
    InvalidCredentials,

    /// 監査ログの永続化先が利用できない
    #[error("audit sink unavailable")]
    AuditSinkUnavailable,
}

impl AuthError {
    /// 外部クライアント向けの固定メッセージ
    ///
    /// 無効トークンと期限切れトークンは同じメッセージを返す。
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::NoToken => "No token provided",
            Self::InvalidToken | Self::ExpiredToken => "Invalid or expired token",
            Self::RoleDenied => "Insufficient permissions",
            Self::InvalidCredentials => "Invalid credentials",
            Self::AuditSinkUnavailable => "Internal server error",
        }
    }

    /// HTTPステータスコード
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoToken | Self::InvalidToken | Self::ExpiredToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::RoleDenied => StatusCode::FORBIDDEN,
            Self::AuditSinkUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// crate-wide error type
#[derive(Debug, Error)]
pub enum LbError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Authentication / authorization outcome
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Service unavailable (e.g., database not configured)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Password hash error
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Conflict error (e.g., duplicate handle)
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl LbError {
    /// Returns a safe error message for external clients.
    ///
    /// The message never contains database details, hashes or token contents.
    /// Use the `Display` implementation only in server logs.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Common(CommonError::Validation(_)) => "Invalid request",
            Self::Common(CommonError::Config(_)) => "Request error",
            Self::Auth(err) => err.external_message(),
            Self::Database(_) => "Database error",
            Self::ServiceUnavailable(_) => "Service temporarily unavailable",
            Self::Internal(_) => "Internal server error",
            Self::PasswordHash(_) => "Internal server error",
            Self::Jwt(_) => "Internal server error",
            Self::Conflict(_) => "Resource conflict",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Common(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => err.status_code(),
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

/// Result alias used across the crate
pub type LbResult<T> = Result<T, LbError>;
