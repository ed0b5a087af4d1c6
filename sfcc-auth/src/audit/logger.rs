//! 監査ログの記録
//!
//! 書き込みは呼び出し元のレスポンス前に同期的に完了させる。
//! 書き込み先の障害は呼び出し元の処理を止めず、`sfcc::audit`ターゲットの
//! errorログと失敗カウンタで運用者に通知する。

use crate::audit::types::{AuditLogFilter, AuditRecord, NewAuditRecord};
use crate::common::error::{AuthError, LbError};
use crate::db::traits::AuditLogRepository;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// 監査イベントのtracingターゲット
pub const AUDIT_TARGET: &str = "sfcc::audit";

/// 監査ログ記録サービス
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditLogRepository>,
    failures: Arc<AtomicU64>,
}

impl AuditLogger {
    /// 書き込み先を指定して作成
    pub fn new(sink: Arc<dyn AuditLogRepository>) -> Self {
        Self {
            sink,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// レコードを1件追記する
    ///
    /// # Returns
    /// * `Ok(id)` - 採番されたレコードID
    /// * `Err(AuthError::AuditSinkUnavailable)` - 書き込み失敗（ログ出力済み）
    pub async fn record(&self, record: NewAuditRecord) -> Result<i64, AuthError> {
        match self.sink.append(&record).await {
            Ok(id) => {
                tracing::info!(
                    target: AUDIT_TARGET,
                    audit_id = id,
                    action = %record.action,
                    actor_id = ?record.actor_id,
                    target_table = ?record.target_table,
                    target_id = ?record.target_id,
                    ip_address = ?record.ip_address,
                    details = %record.details.as_ref().map(|d| d.to_json()).unwrap_or_default(),
                    "audit event recorded"
                );
                Ok(id)
            }
            Err(e) => {
                let total = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::error!(
                    target: AUDIT_TARGET,
                    action = %record.action,
                    actor_id = ?record.actor_id,
                    ip_address = ?record.ip_address,
                    failures = total,
                    error = %e,
                    "Failed to persist audit event"
                );
                Err(AuthError::AuditSinkUnavailable)
            }
        }
    }

    /// 失敗を呼び出し元に返さずに記録する
    pub async fn record_best_effort(&self, record: NewAuditRecord) -> Option<i64> {
        self.record(record).await.ok()
    }

    /// 起動以降の書き込み失敗回数
    pub fn sink_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// 書き込み先が永続的かどうか
    pub fn is_durable(&self) -> bool {
        self.sink.is_durable()
    }

    /// フィルタ条件でレコードを取得（新しい順）
    pub async fn query(&self, filter: &AuditLogFilter) -> Result<Vec<AuditRecord>, LbError> {
        self.sink.query(filter).await
    }

    /// フィルタ条件に一致する件数
    pub async fn count(&self, filter: &AuditLogFilter) -> Result<i64, LbError> {
        self.sink.count(filter).await
    }
}

/// データベース未設定時の書き込み先
///
/// レコードは保存せず、`AuditLogger`が出力するtracingイベントだけが残る。
#[derive(Debug, Default)]
pub struct TracingAuditSink {
    next_id: AtomicI64,
}

impl TracingAuditSink {
    /// 新しいTracingAuditSinkを作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for TracingAuditSink {
    async fn append(&self, _record: &NewAuditRecord) -> Result<i64, LbError> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn query(&self, _filter: &AuditLogFilter) -> Result<Vec<AuditRecord>, LbError> {
        Ok(Vec::new())
    }

    async fn count(&self, _filter: &AuditLogFilter) -> Result<i64, LbError> {
        Ok(0)
    }

    fn is_durable(&self) -> bool {
        false
    }
}
