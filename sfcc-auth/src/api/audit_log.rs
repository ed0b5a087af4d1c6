//! 監査ログAPIハンドラー
//!
//! `/api/audit-logs` の一覧取得

use super::error::AppError;
use crate::audit::types::{ActionKind, AuditLogFilter, AuditRecord};
use crate::common::error::{CommonError, LbError};
use crate::db::audit_log::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// 監査ログ一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryParams {
    /// アクション種別でフィルタ（例: "LOGIN_FAILED"）
    pub action: Option<String>,
    /// 実行者IDでフィルタ
    pub actor_id: Option<i64>,
    /// ページ番号（1始まり、デフォルト: 1）
    pub page: Option<i64>,
    /// ページあたり件数（デフォルト: 50）
    pub per_page: Option<i64>,
}

impl TryFrom<AuditLogQueryParams> for AuditLogFilter {
    type Error = CommonError;

    fn try_from(params: AuditLogQueryParams) -> Result<Self, Self::Error> {
        let action = params
            .action
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase().parse::<ActionKind>())
            .transpose()?;
        Ok(Self {
            action,
            actor_id: params.actor_id,
            page: params.page,
            per_page: params.per_page,
        })
    }
}

/// 監査ログ一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLogListResponse {
    /// 監査レコード一覧（新しい順）
    pub items: Vec<AuditRecord>,
    /// 総件数
    pub total: i64,
    /// 現在のページ番号
    pub page: i64,
    /// ページあたり件数
    pub per_page: i64,
}

/// GET /api/audit-logs - 監査ログ一覧
pub async fn list(
    State(app_state): State<AppState>,
    Query(params): Query<AuditLogQueryParams>,
) -> Result<Json<AuditLogListResponse>, AppError> {
    let filter = AuditLogFilter::try_from(params).map_err(LbError::from)?;
    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let items = app_state.audit.query(&filter).await?;
    let total = app_state.audit.count(&filter).await?;

    Ok(Json(AuditLogListResponse {
        items,
        total,
        page,
        per_page,
    }))
}
