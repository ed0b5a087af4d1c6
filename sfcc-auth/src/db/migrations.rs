// データベース接続プールの作成とマイグレーション実行

use crate::common::error::LbError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 接続プール設定
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// 最大接続数
    pub max_connections: u32,
    /// 接続取得のタイムアウト
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLiteデータベース接続プールを作成してマイグレーションを実行
///
/// データベースファイルが存在しない場合は作成する。
///
/// # Arguments
/// * `database_url` - データベースURL（例: "sqlite:data/sfcc.db"）
/// * `settings` - 接続プール設定
///
/// # Returns
/// * `Ok(SqlitePool)` - 初期化済みデータベースプール
/// * `Err(LbError)` - 初期化失敗
pub async fn initialize_database(
    database_url: &str,
    settings: PoolSettings,
) -> Result<SqlitePool, LbError> {
    ensure_parent_dir(database_url)?;

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| LbError::Database(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| LbError::Database(format!("Failed to connect to database: {}", e)))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// SQLiteファイルの親ディレクトリを作成する
///
/// `sqlite::memory:`のような特殊指定はスキップ
fn ensure_parent_dir(database_url: &str) -> Result<(), LbError> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    if path.starts_with(':') {
        return Ok(());
    }

    let normalized = path.trim_start_matches("//");
    let path_without_params = normalized.split('?').next().unwrap_or(normalized);
    if let Some(parent) = Path::new(path_without_params).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LbError::Database(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// マイグレーションを実行（sqlx::migrate!マクロを使用）
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), LbError> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| LbError::Database(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
