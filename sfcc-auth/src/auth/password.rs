// パスワードハッシュ化と検証（bcrypt実装）

use crate::common::error::LbError;
use bcrypt::{hash, verify, HashParts};

/// パスワードハッシュ化のデフォルトコスト（12推奨、200-300ms）
pub const DEFAULT_HASH_COST: u32 = 12;

/// パスワードをbcryptでハッシュ化（デフォルトコスト）
///
/// # Returns
/// * `Ok(String)` - bcryptハッシュ文字列（$2b$で始まる）
/// * `Err(LbError)` - ハッシュ化失敗
pub fn hash_password(password: &str) -> Result<String, LbError> {
    hash_password_with_cost(password, DEFAULT_HASH_COST)
}

/// パスワードを指定コストでbcryptハッシュ化
///
/// # Arguments
/// * `password` - ハッシュ化するパスワード
/// * `cost` - bcryptコスト（4〜31）
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, LbError> {
    hash(password, cost)
        .map_err(|e| LbError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// パスワードを検証
///
/// 不正な形式のハッシュはエラーにせず不一致として扱う。
/// 平文・ハッシュはログに出さない。
///
/// # Returns
/// * `true` - パスワード一致
/// * `false` - 不一致、またはハッシュが不正
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match verify(password, stored_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!("Password verification failed on malformed hash: {}", e);
            false
        }
    }
}

/// bcryptハッシュに埋め込まれたコストを取得（形式が不正ならNone）
pub fn hash_cost(stored_hash: &str) -> Option<u32> {
    stored_hash
        .parse::<HashParts>()
        .ok()
        .map(|parts| parts.get_cost())
}
