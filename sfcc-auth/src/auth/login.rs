//! ログインフロー
//!
//! 1回のログイン試行につき監査レコードを必ず1件記録する。
//! 失敗理由（未知のハンドル・パスワード不一致・トークン発行失敗）は
//! 呼び出し元には区別せず`InvalidCredentials`として返す。

use crate::audit::types::{ActionKind, AuditDetails, NewAuditRecord};
use crate::audit::AuditLogger;
use crate::auth::credentials::CredentialStore;
use crate::auth::jwt::{IssuedToken, TokenService};
use crate::common::auth::{normalize_handle, Identity};
use crate::common::error::AuthError;
use std::sync::Arc;

/// ログイン監査レコードの対象テーブル
const LOGIN_TARGET: &str = "auth";

/// ログインサービス
#[derive(Clone)]
pub struct LoginService {
    credentials: Arc<CredentialStore>,
    tokens: Arc<TokenService>,
    audit: AuditLogger,
}

impl LoginService {
    /// 新しいLoginServiceを作成
    pub fn new(
        credentials: Arc<CredentialStore>,
        tokens: Arc<TokenService>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            credentials,
            tokens,
            audit,
        }
    }

    /// ハンドルとパスワードで認証し、トークンを発行する
    ///
    /// # Arguments
    /// * `handle` - ユーザー名またはメールアドレス
    /// * `password` - 平文パスワード
    /// * `origin` - 接続元アドレス
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - 認証成功（`LOGIN_SUCCESS`を記録済み）
    /// * `Err(AuthError::InvalidCredentials)` - 認証失敗（`LOGIN_FAILED`を記録済み）
    pub async fn authenticate(
        &self,
        handle: &str,
        password: &str,
        origin: Option<String>,
    ) -> Result<IssuedToken, AuthError> {
        let identity = match self.credentials.resolve(handle).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!("Failed to resolve login handle: {}", e);
                None
            }
        };

        if !self.credentials.verify(identity.as_ref(), password).await {
            let actor_id = identity.as_ref().map(|identity| identity.id);
            tracing::info!(actor_id = ?actor_id, "Login failed");
            self.record(ActionKind::LoginFailed, actor_id, handle, origin)
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        let Some(identity) = identity else {
            return Err(AuthError::InvalidCredentials);
        };

        match self.tokens.issue(&identity) {
            Ok(issued) => {
                self.record(
                    ActionKind::LoginSuccess,
                    Some(identity.id),
                    &identity.handle,
                    origin,
                )
                .await;
                self.touch_last_login(&identity).await;
                tracing::info!(
                    user_id = identity.id,
                    role = %identity.role,
                    "Login succeeded"
                );
                Ok(issued)
            }
            Err(e) => {
                tracing::error!("Failed to issue token after verification: {}", e);
                self.record(ActionKind::LoginFailed, Some(identity.id), handle, origin)
                    .await;
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn record(
        &self,
        action: ActionKind,
        actor_id: Option<i64>,
        handle: &str,
        origin: Option<String>,
    ) {
        let details = AuditDetails::new()
            .with("username", normalize_handle(handle))
            .with("ip_address", origin.clone());
        self.audit
            .record_best_effort(
                NewAuditRecord::new(action)
                    .actor(actor_id)
                    .target(LOGIN_TARGET, None)
                    .details(details)
                    .origin(origin),
            )
            .await;
    }

    async fn touch_last_login(&self, identity: &Identity) {
        if let Err(e) = self.credentials.touch_last_login(identity).await {
            tracing::warn!(user_id = identity.id, "Failed to update last login: {}", e);
        }
    }
}
