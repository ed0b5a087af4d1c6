//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs, and the service
//! configuration built from them.

use crate::auth::credentials::SuperuserCredentials;
use crate::auth::jwt::TokenTtlPolicy;
use crate::auth::password::DEFAULT_HASH_COST;
use crate::common::error::CommonError;
use crate::db::migrations::PoolSettings;
use std::time::Duration;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use sfcc_auth::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("SFCC_PORT", "PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if new_name == old_name {
        return None;
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get an environment variable without a deprecated alias, parsing to a specific type
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    get_env_with_fallback_parse(name, name, default)
}

/// bcryptが受け付けるコストの範囲
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// トークン有効期限の上限（時間）
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// 時間数をトークン有効期限に変換（1〜MAX_TOKEN_TTL_HOURS）
fn ttl_hours(name: &str, hours: i64) -> Result<chrono::Duration, CommonError> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(CommonError::Config(format!(
            "{} must be between 1 and {}",
            name, MAX_TOKEN_TTL_HOURS
        )));
    }
    chrono::Duration::try_hours(hours)
        .ok_or_else(|| CommonError::Config(format!("{} is out of range", name)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// サービス設定
#[derive(Clone)]
pub struct AppConfig {
    /// 待受アドレス
    pub host: String,
    /// 待受ポート
    pub port: u16,
    /// JWT署名シークレット
    pub jwt_secret: String,
    /// シークレットを起動時に生成したか
    pub jwt_secret_generated: bool,
    /// スーパーユーザー（パスワードハッシュ未設定なら無効）
    pub superuser: Option<SuperuserCredentials>,
    /// データベースURL（未設定なら永続化ユーザーなし）
    pub database_url: Option<String>,
    /// トークン有効期限ポリシー
    pub token_ttl: TokenTtlPolicy,
    /// bcryptコスト
    pub bcrypt_cost: u32,
    /// 接続プール設定
    pub pool: PoolSettings,
    /// X-Forwarded-For / X-Real-IPを信頼するか
    pub trust_proxy_headers: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_secret_generated", &self.jwt_secret_generated)
            .field("superuser", &self.superuser)
            .field("database_url", &self.database_url)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("pool", &self.pool)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            jwt_secret: crate::auth::generate_random_token(64),
            jwt_secret_generated: true,
            superuser: None,
            database_url: None,
            token_ttl: TokenTtlPolicy::default(),
            bcrypt_cost: DEFAULT_HASH_COST,
            pool: PoolSettings::default(),
            trust_proxy_headers: false,
        }
    }
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - 検証済み設定
    /// * `Err(CommonError::Config)` - 値が範囲外、またはハッシュ形式が不正
    pub fn from_env() -> Result<Self, CommonError> {
        let host = get_env_with_fallback_or("SFCC_HOST", "SFCC_HOST", "0.0.0.0");
        let port = get_env_with_fallback_parse("SFCC_PORT", "PORT", 5000u16);

        let (jwt_secret, jwt_secret_generated) =
            match non_empty(get_env_with_fallback("SFCC_JWT_SECRET", "JWT_SECRET_KEY")) {
                Some(secret) => (secret, false),
                None => (crate::auth::generate_random_token(64), true),
            };

        let superuser = non_empty(get_env_with_fallback(
            "SFCC_ADMIN_PASSWORD_HASH",
            "ADMIN_PASSWORD_HASH",
        ))
        .map(|password_hash| {
            if !password_hash.starts_with("$2") {
                return Err(CommonError::Config(
                    "SFCC_ADMIN_PASSWORD_HASH must be a bcrypt hash".to_string(),
                ));
            }
            let username =
                get_env_with_fallback_or("SFCC_ADMIN_USERNAME", "SFCC_ADMIN_USERNAME", "admin");
            let username = username.trim();
            if username.is_empty() || username.contains('@') {
                return Err(CommonError::Config(
                    "SFCC_ADMIN_USERNAME must be a non-empty name without '@'".to_string(),
                ));
            }
            Ok(SuperuserCredentials {
                username: username.to_string(),
                password_hash,
            })
        })
        .transpose()?;

        let database_url = non_empty(get_env_with_fallback("SFCC_DATABASE_URL", "DATABASE_URL"));

        let superuser_hours = get_env_parse("SFCC_SUPERUSER_TOKEN_TTL_HOURS", 24i64);
        let persisted_hours = get_env_parse("SFCC_USER_TOKEN_TTL_HOURS", 8i64);
        let token_ttl = TokenTtlPolicy {
            superuser: ttl_hours("SFCC_SUPERUSER_TOKEN_TTL_HOURS", superuser_hours)?,
            persisted: ttl_hours("SFCC_USER_TOKEN_TTL_HOURS", persisted_hours)?,
        };

        let bcrypt_cost = get_env_parse("SFCC_BCRYPT_COST", DEFAULT_HASH_COST);
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(CommonError::Config(format!(
                "SFCC_BCRYPT_COST must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        let pool = PoolSettings {
            max_connections: get_env_parse("SFCC_DB_MAX_CONNECTIONS", 5u32).max(1),
            acquire_timeout: Duration::from_secs(get_env_parse(
                "SFCC_DB_ACQUIRE_TIMEOUT_SECS",
                5u64,
            )),
        };

        let trust_proxy_headers =
            get_env_with_fallback("SFCC_TRUST_PROXY_HEADERS", "SFCC_TRUST_PROXY_HEADERS")
                .map(|v| parse_bool(&v))
                .unwrap_or(false);

        Ok(Self {
            host,
            port,
            jwt_secret,
            jwt_secret_generated,
            superuser,
            database_url,
            token_ttl,
            bcrypt_cost,
            pool,
            trust_proxy_headers,
        })
    }
}
