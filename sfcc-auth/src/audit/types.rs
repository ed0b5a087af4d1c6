//! 監査ログの型定義

use crate::common::error::CommonError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// 監査対象のアクション種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// ログイン成功
    LoginSuccess,
    /// ログイン失敗
    LoginFailed,
    /// ロール不足によるアクセス拒否
    AccessDenied,
    /// ユーザー作成
    UserCreated,
    /// 同意書の署名（業務エンドポイントから記録される）
    ConsentSigned,
}

impl ActionKind {
    /// DBに保存する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::UserCreated => "USER_CREATED",
            Self::ConsentSigned => "CONSENT_SIGNED",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOGIN_SUCCESS" => Ok(Self::LoginSuccess),
            "LOGIN_FAILED" => Ok(Self::LoginFailed),
            "ACCESS_DENIED" => Ok(Self::AccessDenied),
            "USER_CREATED" => Ok(Self::UserCreated),
            "CONSENT_SIGNED" => Ok(Self::ConsentSigned),
            other => Err(CommonError::Validation(format!(
                "unknown audit action: {}",
                other
            ))),
        }
    }
}

/// 詳細情報から除去するキーの断片（小文字比較）
const FORBIDDEN_KEY_FRAGMENTS: [&str; 4] = ["password", "hash", "secret", "token"];

fn is_forbidden_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    FORBIDDEN_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

fn scrub(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_forbidden_key(key))
                .map(|(key, value)| (key, scrub(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(scrub).collect()),
        other => other,
    }
}

/// 監査レコードの詳細情報（スキーマレスなキー/値マップ）
///
/// パスワード・ハッシュ・シークレット・トークンを名前に含むキーは
/// 入れ子も含めて書き込み前に除去される。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditDetails(Map<String, Value>);

impl AuditDetails {
    /// 空の詳細情報
    pub fn new() -> Self {
        Self::default()
    }

    /// キーと値を追加（禁止キーは無視される）
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if is_forbidden_key(key) {
            tracing::warn!(key = %key, "Dropped sensitive key from audit details");
            return self;
        }
        self.0.insert(key.to_string(), scrub(value.into()));
        self
    }

    /// 任意のJSONオブジェクトから作成（禁止キーは除去される）
    pub fn from_value(value: Value) -> Self {
        match scrub(value) {
            Value::Object(map) => Self(map),
            other => Self(Map::from_iter([("value".to_string(), other)])),
        }
    }

    /// キーの値を取得
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON文字列に変換
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// 書き込み前の監査レコード
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditRecord {
    /// 実行者のアイデンティティID（未知のハンドルでのログイン失敗はNone）
    pub actor_id: Option<i64>,
    /// アクション種別
    pub action: ActionKind,
    /// 対象テーブル
    pub target_table: Option<String>,
    /// 対象レコードID
    pub target_id: Option<String>,
    /// 詳細情報
    pub details: Option<AuditDetails>,
    /// 接続元アドレス
    pub ip_address: Option<String>,
    /// 記録日時
    pub recorded_at: DateTime<Utc>,
}

impl NewAuditRecord {
    /// 現在時刻で記録するレコードを作成
    pub fn new(action: ActionKind) -> Self {
        Self {
            actor_id: None,
            action,
            target_table: None,
            target_id: None,
            details: None,
            ip_address: None,
            recorded_at: Utc::now(),
        }
    }

    /// 実行者IDを設定
    pub fn actor(mut self, actor_id: Option<i64>) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// 対象テーブルとレコードIDを設定
    pub fn target(mut self, table: &str, id: Option<String>) -> Self {
        self.target_table = Some(table.to_string());
        self.target_id = id;
        self
    }

    /// 詳細情報を設定（空の場合は保存しない）
    pub fn details(mut self, details: AuditDetails) -> Self {
        self.details = (!details.is_empty()).then_some(details);
        self
    }

    /// 接続元アドレスを設定
    pub fn origin(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}

/// 保存済みの監査レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// レコードID（ストアが採番、単調増加）
    pub id: i64,
    /// 実行者のアイデンティティID
    pub actor_id: Option<i64>,
    /// アクション種別
    pub action: ActionKind,
    /// 対象テーブル
    pub target_table: Option<String>,
    /// 対象レコードID
    pub target_id: Option<String>,
    /// 詳細情報
    pub details: Option<AuditDetails>,
    /// 接続元アドレス
    pub ip_address: Option<String>,
    /// 記録日時
    pub recorded_at: DateTime<Utc>,
}

/// 監査ログフィルタ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    /// アクション種別でフィルタ
    pub action: Option<ActionKind>,
    /// 実行者IDでフィルタ
    pub actor_id: Option<i64>,
    /// ページ番号（1始まり）
    pub page: Option<i64>,
    /// ページあたり件数
    pub per_page: Option<i64>,
}
