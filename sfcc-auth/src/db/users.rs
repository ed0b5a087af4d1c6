// ユーザー（永続化アイデンティティ）操作

use crate::common::auth::{normalize_handle, Identity, IdentityKind, Role};
use crate::common::error::LbError;
use crate::db::traits::IdentityRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// ユーザーを作成
///
/// ユーザー名・メールアドレスは正規化して保存する。
/// どちらかが既存ユーザーのユーザー名またはメールアドレスと衝突する場合は`Conflict`。
///
/// # Arguments
/// * `pool` - データベース接続プール
/// * `username` - ユーザー名
/// * `email` - メールアドレス（任意）
/// * `password_hash` - bcryptハッシュ化されたパスワード
/// * `role` - ロール
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
    role: Role,
) -> Result<Identity, LbError> {
    let username = normalize_handle(username);
    let email = email.map(normalize_handle).filter(|e| !e.is_empty());

    for handle in std::iter::once(&username).chain(email.iter()) {
        if find_by_handle(pool, handle).await?.is_some() {
            return Err(LbError::Conflict(format!("Handle '{}' already exists", handle)));
        }
    }

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role, created_at, last_login)
         VALUES (?, ?, ?, ?, ?, NULL)",
    )
    .bind(&username)
    .bind(&email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            LbError::Conflict(format!("Handle '{}' already exists", username))
        } else {
            LbError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(Identity {
        id: result.last_insert_rowid(),
        handle: username,
        email,
        password_hash: password_hash.to_string(),
        role,
        kind: IdentityKind::Persisted,
    })
}

/// ハンドル（ユーザー名またはメールアドレス）でユーザーを検索
///
/// 照合は大文字小文字を区別しない。
///
/// # Returns
/// * `Ok(Some(Identity))` - ユーザーが見つかった
/// * `Ok(None)` - ユーザーが見つからなかった
/// * `Err(LbError)` - 検索失敗、または保存済みロールが不明
pub async fn find_by_handle(pool: &SqlitePool, handle: &str) -> Result<Option<Identity>, LbError> {
    let handle = normalize_handle(handle);
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, role FROM users
         WHERE username = ? OR email = ? ORDER BY id ASC LIMIT 1",
    )
    .bind(&handle)
    .bind(&handle)
    .fetch_optional(pool)
    .await
    .map_err(|e| LbError::Database(format!("Failed to find user: {}", e)))?;

    row.map(Identity::try_from).transpose()
}

/// すべてのユーザーを取得
pub async fn list(pool: &SqlitePool) -> Result<Vec<Identity>, LbError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, role FROM users ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| LbError::Database(format!("Failed to list users: {}", e)))?;

    rows.into_iter().map(Identity::try_from).collect()
}

/// 最終ログイン日時を更新
pub async fn update_last_login(pool: &SqlitePool, id: i64) -> Result<(), LbError> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| LbError::Database(format!("Failed to update last login: {}", e)))?;

    Ok(())
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for Identity {
    type Error = LbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        // 不明なロールを既定ロールに丸めない
        let role = row.role.parse::<Role>().map_err(|_| {
            LbError::Database(format!("User {} has an unknown role", row.id))
        })?;

        Ok(Identity {
            id: row.id,
            handle: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            kind: IdentityKind::Persisted,
        })
    }
}

/// SQLiteによる`IdentityRepository`実装
#[derive(Clone)]
pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    /// 新しいUserStorageを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for UserStorage {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, LbError> {
        find_by_handle(&self.pool, handle).await
    }

    async fn create_identity(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: Role,
    ) -> Result<Identity, LbError> {
        create(&self.pool, username, email, password_hash, role).await
    }

    async fn list_identities(&self) -> Result<Vec<Identity>, LbError> {
        list(&self.pool).await
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), LbError> {
        update_last_login(&self.pool, id).await
    }
}
