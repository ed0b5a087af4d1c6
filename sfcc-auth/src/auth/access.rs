//! アクセス制御
//!
//! トークンを検証し、ロールが要求ロール集合に含まれるかを判定する。
//! 拒否判定（403）だけが監査対象で、401系の失敗は記録しない。

use crate::audit::types::{ActionKind, AuditDetails, NewAuditRecord};
use crate::audit::AuditLogger;
use crate::auth::jwt::TokenService;
use crate::common::auth::{Claims, RoleSet};
use crate::common::error::AuthError;
use std::sync::Arc;

/// 認可判定に渡すリクエスト情報
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// 操作名（監査ログの`endpoint`）
    pub operation: String,
    /// 接続元アドレス
    pub origin_address: Option<String>,
}

impl RequestContext {
    /// 新しいRequestContextを作成
    pub fn new(operation: impl Into<String>, origin_address: Option<String>) -> Self {
        Self {
            operation: operation.into(),
            origin_address,
        }
    }
}

/// アクセスコントローラー
#[derive(Clone)]
pub struct AccessController {
    tokens: Arc<TokenService>,
    audit: AuditLogger,
}

impl AccessController {
    /// 新しいAccessControllerを作成
    pub fn new(tokens: Arc<TokenService>, audit: AuditLogger) -> Self {
        Self { tokens, audit }
    }

    /// 保護された操作の実行可否を判定
    ///
    /// # Arguments
    /// * `bearer` - Bearerトークン（ヘッダーなしはNone）
    /// * `required` - 許可ロール集合
    /// * `ctx` - 操作名と接続元
    ///
    /// # Returns
    /// * `Ok(Claims)` - 許可（監査なし）
    /// * `Err(AuthError::NoToken | InvalidToken | ExpiredToken)` - 401（監査なし）
    /// * `Err(AuthError::RoleDenied)` - 403（`ACCESS_DENIED`を記録済み）
    pub async fn authorize(
        &self,
        bearer: Option<&str>,
        required: &RoleSet,
        ctx: &RequestContext,
    ) -> Result<Claims, AuthError> {
        let token = bearer.ok_or(AuthError::NoToken)?;
        let claims = self.tokens.validate(token)?;

        if required.contains(claims.role) {
            return Ok(claims);
        }

        tracing::warn!(
            user_id = claims.user_id,
            role = %claims.role,
            operation = %ctx.operation,
            "Access denied"
        );

        let details = AuditDetails::new()
            .with("endpoint", ctx.operation.as_str())
            .with("required_roles", required.names())
            .with("role", claims.role.as_str());
        self.audit
            .record_best_effort(
                NewAuditRecord::new(ActionKind::AccessDenied)
                    .actor(Some(claims.user_id))
                    .details(details)
                    .origin(ctx.origin_address.clone()),
            )
            .await;

        Err(AuthError::RoleDenied)
    }
}
