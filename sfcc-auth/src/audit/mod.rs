//! 監査ログシステム
//!
//! ログイン・アクセス拒否・ユーザー作成などのセキュリティイベントを
//! 追記専用ストアに記録する

/// 監査ログの型定義
pub mod types;

/// 監査ログの記録サービス
pub mod logger;

pub use logger::{AuditLogger, TracingAuditSink};
