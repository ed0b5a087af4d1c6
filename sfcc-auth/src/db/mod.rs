//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

/// ユーザー管理
pub mod users;

/// 監査ログストレージ
pub mod audit_log;

/// データベースマイグレーション
pub mod migrations;

/// Repository traitパターン（テスタビリティ向上）
pub mod traits;
