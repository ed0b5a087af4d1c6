//! SFCC admin API authentication layer
//!
//! ログイン・トークン発行・ロールベースのアクセス制御・監査ログを提供する

#![warn(missing_docs)]

/// 共通型定義（ロール・エラー・接続元アドレス）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// 監査ログシステム
pub mod audit;

/// 認証・認可機能
pub mod auth;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// データベースアクセス
pub mod db;

/// ロギング初期化ユーティリティ
pub mod logging;

/// サーバー起動・シャットダウン
pub mod server;

use crate::audit::{AuditLogger, TracingAuditSink};
use crate::auth::access::AccessController;
use crate::auth::credentials::CredentialStore;
use crate::auth::jwt::TokenService;
use crate::auth::login::LoginService;
use crate::common::error::LbError;
use crate::config::AppConfig;
use crate::db::audit_log::AuditLogStorage;
use crate::db::traits::{AuditLogRepository, IdentityRepository};
use crate::db::users::UserStorage;
use std::sync::Arc;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// サービス設定
    pub config: Arc<AppConfig>,
    /// データベース接続プール（未設定なら永続化ユーザーなし）
    pub db_pool: Option<sqlx::SqlitePool>,
    /// アイデンティティ解決
    pub credentials: Arc<CredentialStore>,
    /// 永続化ユーザーのストア
    pub users: Option<Arc<dyn IdentityRepository>>,
    /// トークン発行・検証
    pub tokens: Arc<TokenService>,
    /// ログインフロー
    pub login: LoginService,
    /// アクセス制御
    pub access: AccessController,
    /// 監査ログ
    pub audit: AuditLogger,
}

impl AppState {
    /// 設定と接続プールからアプリケーション状態を組み立てる
    ///
    /// プールがない場合、監査ログはtracingにのみ出力される。
    pub fn build(config: AppConfig, db_pool: Option<sqlx::SqlitePool>) -> Result<Self, LbError> {
        let users: Option<Arc<dyn IdentityRepository>> = db_pool
            .clone()
            .map(|pool| Arc::new(UserStorage::new(pool)) as Arc<dyn IdentityRepository>);
        let sink: Arc<dyn AuditLogRepository> = match &db_pool {
            Some(pool) => Arc::new(AuditLogStorage::new(pool.clone())),
            None => Arc::new(TracingAuditSink::new()),
        };
        let audit = AuditLogger::new(sink);

        let credentials = Arc::new(CredentialStore::new(
            config.superuser.clone(),
            users.clone(),
            config.bcrypt_cost,
        )?);
        let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl));

        Ok(Self {
            login: LoginService::new(credentials.clone(), tokens.clone(), audit.clone()),
            access: AccessController::new(tokens.clone(), audit.clone()),
            config: Arc::new(config),
            db_pool,
            credentials,
            users,
            tokens,
            audit,
        })
    }

    /// 設定に従ってデータベースを初期化し、アプリケーション状態を組み立てる
    pub async fn initialize(config: AppConfig) -> Result<Self, LbError> {
        let db_pool = match &config.database_url {
            Some(url) => {
                Some(crate::db::migrations::initialize_database(url, config.pool).await?)
            }
            None => None,
        };
        Self::build(config, db_pool)
    }
}
