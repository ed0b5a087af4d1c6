// JWT生成と検証（jsonwebtoken実装）

use crate::common::auth::{Claims, Identity, IdentityKind};
use crate::common::error::{AuthError, LbError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// アイデンティティ種別ごとのトークン有効期限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtlPolicy {
    /// スーパーユーザー（デフォルト24時間）
    pub superuser: Duration,
    /// 永続化ユーザー（デフォルト8時間）
    pub persisted: Duration,
}

impl Default for TokenTtlPolicy {
    fn default() -> Self {
        Self {
            superuser: Duration::hours(24),
            persisted: Duration::hours(8),
        }
    }
}

impl TokenTtlPolicy {
    /// 種別に対応する有効期限
    pub fn ttl_for(&self, kind: IdentityKind) -> Duration {
        match kind {
            IdentityKind::Superuser => self.superuser,
            IdentityKind::Persisted => self.persisted,
        }
    }
}

/// 発行済みトークン
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// JWT文字列
    pub token: String,
    /// 埋め込んだクレーム
    pub claims: Claims,
    /// 有効期限までの秒数
    pub expires_in: i64,
}

/// トークン発行・検証サービス
///
/// プロセス全体で1つの署名シークレットを共有する。
/// シークレットを変更すると発行済みトークンはすべて無効になる。
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TokenTtlPolicy,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// シークレットと有効期限ポリシーからサービスを作成
    pub fn new(secret: &str, ttl: TokenTtlPolicy) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// 有効期限ポリシー
    pub fn ttl_policy(&self) -> TokenTtlPolicy {
        self.ttl
    }

    /// 現在時刻でトークンを発行
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, LbError> {
        self.issue_at(identity, Utc::now())
    }

    /// 指定時刻を発行時刻としてトークンを発行
    ///
    /// # Arguments
    /// * `identity` - 認証済みアイデンティティ
    /// * `issued_at` - 発行時刻（exp = issued_at + ttl）
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - 署名済みトークン
    /// * `Err(LbError::Jwt)` - 生成失敗
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, LbError> {
        let ttl = self.ttl.ttl_for(identity.kind);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| LbError::Jwt("Failed to calculate expiration time".to_string()))?;

        let claims = Claims {
            user_id: identity.id,
            username: identity.handle.clone(),
            role: identity.role,
            iat: issued_at.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| LbError::Jwt(format!("Failed to create JWT: {}", e)))?;

        Ok(IssuedToken {
            token,
            claims,
            expires_in: ttl.num_seconds(),
        })
    }

    /// トークンを検証
    ///
    /// 署名を先に検証し、その後に有効期限を確認する。
    ///
    /// # Returns
    /// * `Ok(Claims)` - 検証済みクレーム
    /// * `Err(AuthError::NoToken)` - 空文字列
    /// * `Err(AuthError::ExpiredToken)` - 署名は正しいが期限切れ
    /// * `Err(AuthError::InvalidToken)` - 署名不一致・構造不正
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::NoToken);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => {
                    tracing::debug!("JWT verification failed: {}", e);
                    AuthError::InvalidToken
                }
            })
    }
}
