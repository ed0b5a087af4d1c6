//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use crate::common::error::{AuthError, LbError};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub LbError);

impl From<LbError> for AppError {
    fn from(err: LbError) -> Self {
        AppError(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError(LbError::Auth(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        // 詳細はサーバーログのみ、レスポンスには固定メッセージだけを返す
        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::SERVICE_UNAVAILABLE
        {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let payload = json!({
            "error": self.0.external_message()
        });

        (status, Json(payload)).into_response()
    }
}
