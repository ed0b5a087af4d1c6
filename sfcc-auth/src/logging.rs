//! ロギング初期化ユーティリティ
//!
//! `SFCC_LOG_LEVEL`（旧: `RUST_LOG`）のフィルタ指定で`tracing-subscriber`を初期化する。
//! 監査イベントは`sfcc::audit`ターゲットで出力される。

use crate::config::get_env_with_fallback_or;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 環境変数からログフィルタ文字列を取得
pub fn log_filter_from_env() -> String {
    get_env_with_fallback_or("SFCC_LOG_LEVEL", "RUST_LOG", DEFAULT_LOG_FILTER)
}

/// tracingサブスクライバーを初期化する（プロセスで1回）
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_new(log_filter_from_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
