//! 監査ログストレージ
//!
//! `audit_log`テーブルは追記専用（UPDATE/DELETEはトリガーで拒否される）

use crate::audit::types::{ActionKind, AuditDetails, AuditLogFilter, AuditRecord, NewAuditRecord};
use crate::common::error::{CommonError, LbError, LbResult};
use crate::db::traits::AuditLogRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// ページあたり件数の上限
pub const MAX_PER_PAGE: i64 = 500;

/// ページあたり件数のデフォルト
pub const DEFAULT_PER_PAGE: i64 = 50;

/// 監査ログのDB操作
#[derive(Clone)]
pub struct AuditLogStorage {
    pool: SqlitePool,
}

/// sqlx::FromRow用の行構造体
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: i64,
    user_id: Option<i64>,
    action_type: String,
    target_table: Option<String>,
    target_id: Option<String>,
    details: Option<String>,
    ip_address: Option<String>,
    created_at: String,
}

impl TryFrom<AuditLogRow> for AuditRecord {
    type Error = LbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let action = row
            .action_type
            .parse::<ActionKind>()
            .map_err(|e| LbError::Database(format!("Invalid audit row {}: {}", row.id, e)))?;
        let recorded_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| LbError::Database(format!("Invalid audit timestamp: {}", e)))?
            .with_timezone(&Utc);
        let details = row
            .details
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| LbError::Database(format!("Invalid audit details: {}", e)))?
            .map(AuditDetails::from_value);

        Ok(AuditRecord {
            id: row.id,
            actor_id: row.user_id,
            action,
            target_table: row.target_table,
            target_id: row.target_id,
            details,
            ip_address: row.ip_address,
            recorded_at,
        })
    }
}

/// フィルタからWHERE句とバインド値を構築
fn build_where_clause(filter: &AuditLogFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(action) = filter.action {
        conditions.push("action_type = ?");
        values.push(action.as_str().to_string());
    }
    if let Some(actor_id) = filter.actor_id {
        conditions.push("user_id = ?");
        values.push(actor_id.to_string());
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

/// ページ番号と件数からOFFSETを計算（オーバーフローは入力不正）
fn page_offset(page: i64, per_page: i64) -> LbResult<i64> {
    (page - 1).checked_mul(per_page).ok_or_else(|| {
        LbError::Common(CommonError::Validation(format!(
            "page {} is out of range",
            page
        )))
    })
}

impl AuditLogStorage {
    /// 新しいAuditLogStorageを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 1件追記し、採番されたIDを返す
    pub async fn insert(&self, record: &NewAuditRecord) -> LbResult<i64> {
        let details = record.details.as_ref().map(|d| d.to_json());

        let result = sqlx::query(
            r#"INSERT INTO audit_log (
                user_id, action_type, target_table, target_id, details, ip_address, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.actor_id)
        .bind(record.action.as_str())
        .bind(&record.target_table)
        .bind(&record.target_id)
        .bind(details)
        .bind(&record.ip_address)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LbError::Database(format!("Failed to insert audit log: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// フィルタ条件でレコードを取得（新しい順）
    pub async fn query(&self, filter: &AuditLogFilter) -> LbResult<Vec<AuditRecord>> {
        let (where_clause, bind_values) = build_where_clause(filter);
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let offset = page_offset(page, per_page)?;

        let sql = format!(
            "SELECT id, user_id, action_type, target_table, target_id, details, ip_address, created_at \
             FROM audit_log {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut query = sqlx::query_as::<_, AuditLogRow>(&sql);
        for val in &bind_values {
            query = query.bind(val.as_str());
        }
        query = query.bind(per_page).bind(offset);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LbError::Database(format!("Failed to query audit logs: {}", e)))?;

        rows.into_iter()
            .map(AuditRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
    }

    /// フィルタ条件に一致する件数
    pub async fn count(&self, filter: &AuditLogFilter) -> LbResult<i64> {
        let (where_clause, bind_values) = build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_log {}", where_clause);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for val in &bind_values {
            query = query.bind(val.as_str());
        }

        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LbError::Database(format!("Failed to count audit logs: {}", e)))
    }
}

#[async_trait]
impl AuditLogRepository for AuditLogStorage {
    async fn append(&self, record: &NewAuditRecord) -> Result<i64, LbError> {
        self.insert(record).await
    }

    async fn query(&self, filter: &AuditLogFilter) -> Result<Vec<AuditRecord>, LbError> {
        AuditLogStorage::query(self, filter).await
    }

    async fn count(&self, filter: &AuditLogFilter) -> Result<i64, LbError> {
        AuditLogStorage::count(self, filter).await
    }
}
