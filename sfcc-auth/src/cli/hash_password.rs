//! hash-password サブコマンド
//!
//! 入力されたパスワードのbcryptハッシュを出力します。

use crate::auth::password::{hash_password_with_cost, DEFAULT_HASH_COST};
use crate::common::error::{CommonError, LbError};
use crate::config::get_env_parse;
use clap::Args;

/// hash-password サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct HashPasswordArgs {
    /// bcrypt cost (default: SFCC_BCRYPT_COST or 12)
    #[arg(long)]
    pub cost: Option<u32>,
}

/// 確認入力が一致する場合のみハッシュ化する
pub fn hash_confirmed(password: &str, confirmation: &str, cost: u32) -> Result<String, LbError> {
    if password.is_empty() {
        return Err(CommonError::Validation("password must not be empty".to_string()).into());
    }
    if password != confirmation {
        return Err(CommonError::Validation("passwords do not match".to_string()).into());
    }
    hash_password_with_cost(password, cost)
}

/// パスワードを2回入力させてハッシュを返す
pub fn execute(args: &HashPasswordArgs) -> Result<String, LbError> {
    let cost = args
        .cost
        .unwrap_or_else(|| get_env_parse("SFCC_BCRYPT_COST", DEFAULT_HASH_COST));

    let read = |prompt: &str| {
        rpassword::prompt_password(prompt)
            .map_err(|e| LbError::Internal(format!("Failed to read password: {}", e)))
    };
    let password = read("Password: ")?;
    let confirmation = read("Confirm password: ")?;

    hash_confirmed(&password, &confirmation, cost)
}
