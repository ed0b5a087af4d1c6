//! Repository traitパターン定義
//!
//! DB操作を抽象化し、テスタビリティを向上させるためのtrait群。
//! 監査ログの書き込み先を差し替えることで、永続化先の障害時の挙動も検証できる。

use async_trait::async_trait;

use crate::audit::types::{AuditLogFilter, AuditRecord, NewAuditRecord};
use crate::common::auth::{Identity, Role};
use crate::common::error::LbError;

// ---------------------------------------------------------------------------
// IdentityRepository
// ---------------------------------------------------------------------------

/// 永続化アイデンティティのRepository trait
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// 正規化済みハンドル（ユーザー名またはメールアドレス）で検索
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, LbError>;
    /// アイデンティティを作成
    async fn create_identity(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> Result<Identity, LbError>;
    /// アイデンティティ一覧
    async fn list_identities(&self) -> Result<Vec<Identity>, LbError>;
    /// 最終ログイン日時を更新
    async fn touch_last_login(&self, id: i64) -> Result<(), LbError>;
}

// ---------------------------------------------------------------------------
// AuditLogRepository
// ---------------------------------------------------------------------------

/// 監査ログ書き込み先のRepository trait
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// レコードを追記し、採番されたIDを返す
    async fn append(&self, record: &NewAuditRecord) -> Result<i64, LbError>;
    /// フィルタ条件でレコードを取得（新しい順）
    async fn query(&self, filter: &AuditLogFilter) -> Result<Vec<AuditRecord>, LbError>;
    /// フィルタ条件に一致する件数
    async fn count(&self, filter: &AuditLogFilter) -> Result<i64, LbError>;
    /// 永続的な書き込み先かどうか
    fn is_durable(&self) -> bool {
        true
    }
}
