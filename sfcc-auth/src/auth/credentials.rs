//! アイデンティティ解決
//!
//! 環境変数のスーパーユーザーを優先し、次に永続化ユーザーを検索する。

use crate::auth::password::{hash_cost, hash_password_with_cost, verify_password};
use crate::common::auth::{normalize_handle, Identity, IdentityKind, Role, SUPERUSER_ID};
use crate::common::error::LbError;
use crate::db::traits::IdentityRepository;
use std::sync::Arc;

/// スーパーユーザー設定
#[derive(Clone)]
pub struct SuperuserCredentials {
    /// ユーザー名
    pub username: String,
    /// bcryptハッシュ
    pub password_hash: String,
}

impl std::fmt::Debug for SuperuserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperuserCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// ハンドルからアイデンティティを解決するストア
pub struct CredentialStore {
    superuser: Option<Identity>,
    repository: Option<Arc<dyn IdentityRepository>>,
    dummy_hash: String,
}

impl CredentialStore {
    /// ストアを作成
    ///
    /// 未知のハンドルに対する照合用にダミーハッシュを生成する。
    /// コストはスーパーユーザーのハッシュに合わせ、未設定なら`bcrypt_cost`を使う。
    pub fn new(
        superuser: Option<SuperuserCredentials>,
        repository: Option<Arc<dyn IdentityRepository>>,
        bcrypt_cost: u32,
    ) -> Result<Self, LbError> {
        let superuser = superuser.map(|creds| Identity {
            id: SUPERUSER_ID,
            handle: normalize_handle(&creds.username),
            email: None,
            password_hash: creds.password_hash,
            role: Role::Admin,
            kind: IdentityKind::Superuser,
        });
        let dummy_cost = superuser
            .as_ref()
            .and_then(|identity| hash_cost(&identity.password_hash))
            .unwrap_or(bcrypt_cost);
        if repository.is_some() && dummy_cost != bcrypt_cost {
            tracing::warn!(
                superuser_cost = dummy_cost,
                user_cost = bcrypt_cost,
                "Superuser hash cost differs from SFCC_BCRYPT_COST; login timing is not uniform"
            );
        }
        let dummy_hash =
            hash_password_with_cost(&crate::auth::generate_random_token(32), dummy_cost)?;

        Ok(Self {
            superuser,
            repository,
            dummy_hash,
        })
    }

    /// スーパーユーザーのハンドル（設定されている場合）
    pub fn superuser_handle(&self) -> Option<&str> {
        self.superuser.as_ref().map(|identity| identity.handle.as_str())
    }

    /// 永続化ユーザーのストアが設定されているか
    pub fn has_repository(&self) -> bool {
        self.repository.is_some()
    }

    /// ハンドル（ユーザー名またはメールアドレス）を解決
    ///
    /// # Returns
    /// * `Ok(Some(Identity))` - 一致するアイデンティティ
    /// * `Ok(None)` - 一致なし
    /// * `Err(LbError)` - ストア障害
    pub async fn resolve(&self, handle: &str) -> Result<Option<Identity>, LbError> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            return Ok(None);
        }

        if let Some(superuser) = &self.superuser {
            if superuser.handle == handle {
                return Ok(Some(superuser.clone()));
            }
        }

        match &self.repository {
            Some(repository) => repository.find_by_handle(&handle).await,
            None => Ok(None),
        }
    }

    /// パスワードを照合
    ///
    /// アイデンティティが未解決でもダミーハッシュに対して照合を行い、結果は常にfalse。
    pub async fn verify(&self, identity: Option<&Identity>, password: &str) -> bool {
        let (stored_hash, resolved) = match identity {
            Some(identity) => (identity.password_hash.clone(), true),
            None => (self.dummy_hash.clone(), false),
        };
        let password = password.to_string();

        let matched =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Password verification task failed: {}", e);
                    false
                });

        resolved && matched
    }

    /// 最終ログイン日時を更新（スーパーユーザーは対象外）
    pub async fn touch_last_login(&self, identity: &Identity) -> Result<(), LbError> {
        match (&self.repository, identity.kind) {
            (Some(repository), IdentityKind::Persisted) => {
                repository.touch_last_login(identity.id).await
            }
            _ => Ok(()),
        }
    }
}
