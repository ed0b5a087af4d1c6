//! システム情報API

use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// サービス名
pub const SERVICE_NAME: &str = "SFCC Command Suite API";

/// ルートレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// サービス名
    pub service: String,
    /// バージョン
    pub version: String,
}

/// 監査ログの状態
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditStatus {
    /// 永続化されるか
    pub durable: bool,
    /// 起動以降の書き込み失敗回数
    pub sink_failures: u64,
}

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 状態（"healthy" / "degraded"）
    pub status: String,
    /// バージョン
    pub version: String,
    /// データベース状態（"connected" / "unavailable" / "not configured"）
    pub database: String,
    /// 監査ログの状態
    pub audit: AuditStatus,
}

/// GET / - サービス情報
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health - ヘルスチェック
///
/// データベース障害や監査ログの書き込み失敗があれば`degraded`を返す。
pub async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let database = match &app_state.db_pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "connected",
            Err(e) => {
                tracing::warn!("Database health check failed: {}", e);
                "unavailable"
            }
        },
        None => "not configured",
    };
    let sink_failures = app_state.audit.sink_failures();
    let status = if database == "unavailable" || sink_failures > 0 {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        audit: AuditStatus {
            durable: app_state.audit.is_durable(),
            sink_failures,
        },
    })
}
