//! serve サブコマンド
//!
//! APIサーバーを起動します。

use crate::common::error::LbError;
use crate::config::AppConfig;
use crate::AppState;
use clap::Args;

/// serve サブコマンドの引数
///
/// 指定がない場合は環境変数（`SFCC_HOST` / `SFCC_PORT`）の値を使う。
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address
    #[arg(short = 'H', long)]
    pub host: Option<String>,
}

impl ServeArgs {
    /// 引数で環境変数由来の設定を上書きする
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

/// サーバーを起動する
pub async fn execute(args: &ServeArgs) -> Result<(), LbError> {
    let config = args.apply(AppConfig::from_env()?);
    let bind_addr = format!("{}:{}", config.host, config.port);

    let state = AppState::initialize(config).await?;
    crate::server::run(state, &bind_addr).await
}
