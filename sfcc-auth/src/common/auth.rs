// 認証関連のデータモデル

use super::error::CommonError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 環境変数スーパーユーザーに予約されたID
pub const SUPERUSER_ID: i64 = 0;

/// ユーザーロール
///
/// ロール間に継承関係はない。操作ごとに許可ロールを列挙する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 管理者（環境変数スーパーユーザーのロール）
    Admin,
    /// 理事会
    BoardOfDirectors,
    /// 外部監査人
    ExternalAuditor,
    /// 本部スタッフ
    ExecutiveStaff,
    /// CFO / 財務担当
    CfoTreasurer,
    /// サポートスタッフ（DTE/リスク）
    SupportStaff,
    /// 地域司令
    RegionalCommander,
    /// 飛行隊司令
    SquadronCommander,
    /// 審査員 / 教官
    ReviewerInstructor,
    /// 士官候補生
    Cadet,
    /// 保護者
    ParentGuardian,
}

impl Role {
    /// すべてのロール
    pub const ALL: [Role; 11] = [
        Role::Admin,
        Role::BoardOfDirectors,
        Role::ExternalAuditor,
        Role::ExecutiveStaff,
        Role::CfoTreasurer,
        Role::SupportStaff,
        Role::RegionalCommander,
        Role::SquadronCommander,
        Role::ReviewerInstructor,
        Role::Cadet,
        Role::ParentGuardian,
    ];

    /// DB/JWTに保存する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::BoardOfDirectors => "board_of_directors",
            Self::ExternalAuditor => "external_auditor",
            Self::ExecutiveStaff => "executive_staff",
            Self::CfoTreasurer => "cfo_treasurer",
            Self::SupportStaff => "support_staff",
            Self::RegionalCommander => "regional_commander",
            Self::SquadronCommander => "squadron_commander",
            Self::ReviewerInstructor => "reviewer_instructor",
            Self::Cadet => "cadet",
            Self::ParentGuardian => "parent_guardian",
        }
    }

    /// ロールに付与された権限
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::Admin => &Permission::ALL,
            Self::BoardOfDirectors => &[
                ViewHqDashboard,
                ViewAuditedFinancials,
                ApprovePolicyAmendment,
            ],
            Self::ExternalAuditor => &[
                ViewHqDashboard,
                ViewAllFinancials,
                ViewAuditedFinancials,
            ],
            Self::ExecutiveStaff => &[
                ViewHqDashboard,
                ViewPiiSensitive,
                ManageWorkflows,
                ApproveArchival,
            ],
            Self::CfoTreasurer => &[
                ViewHqDashboard,
                ViewAllFinancials,
                ViewAuditedFinancials,
                ExecuteFinancialDisbursement,
            ],
            Self::SupportStaff => &[
                ViewHqDashboard,
                ViewPiiSensitive,
                ManageRubricSchema,
                ManageWorkflows,
            ],
            Self::RegionalCommander => &[
                ViewHqDashboard,
                ViewRegionalDashboard,
                IssueCorrectiveOrder,
            ],
            Self::SquadronCommander => &[
                ViewSquadronDashboard,
                ViewLocalSquadronData,
                ApproveLocalWaiver,
                IssueCorrectiveOrder,
            ],
            Self::ReviewerInstructor => &[
                ViewSquadronDashboard,
                ViewLocalSquadronData,
                ScoreArtifact,
                AttestSafetyOpsec,
            ],
            Self::Cadet => &[ViewCadetDashboard, ViewOwnPortfolio, UpdateOwnPortfolio],
            Self::ParentGuardian => &[ViewParentDashboard, ViewOwnPortfolio],
        }
    }

    /// 権限を保持しているか
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CommonError::Validation(format!("unknown role: {}", s)))
    }
}

/// 権限カタログ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// 本部ダッシュボード閲覧
    #[serde(rename = "view:hq_dashboard")]
    ViewHqDashboard,
    /// 地域ダッシュボード閲覧
    #[serde(rename = "view:regional_dashboard")]
    ViewRegionalDashboard,
    /// 飛行隊ダッシュボード閲覧
    #[serde(rename = "view:squadron_dashboard")]
    ViewSquadronDashboard,
    /// 候補生ダッシュボード閲覧
    #[serde(rename = "view:cadet_dashboard")]
    ViewCadetDashboard,
    /// 保護者ダッシュボード閲覧
    #[serde(rename = "view:parent_dashboard")]
    ViewParentDashboard,
    /// 全財務情報の閲覧
    #[serde(rename = "read:financials_all")]
    ViewAllFinancials,
    /// 監査済み財務情報の閲覧
    #[serde(rename = "read:financials_audited")]
    ViewAuditedFinancials,
    /// 個人情報の閲覧
    #[serde(rename = "read:pii_sensitive")]
    ViewPiiSensitive,
    /// 自身のポートフォリオ閲覧
    #[serde(rename = "read:own_portfolio")]
    ViewOwnPortfolio,
    /// 所属飛行隊データの閲覧
    #[serde(rename = "read:local_squadron_data")]
    ViewLocalSquadronData,
    /// 支出の実行
    #[serde(rename = "write:financial_disbursement")]
    ExecuteFinancialDisbursement,
    /// 成果物の採点
    #[serde(rename = "write:artifact_score")]
    ScoreArtifact,
    /// 安全・OPSECの証明
    #[serde(rename = "write:safety_opsec")]
    AttestSafetyOpsec,
    /// 自身のポートフォリオ更新
    #[serde(rename = "write:own_portfolio")]
    UpdateOwnPortfolio,
    /// 飛行隊単位の免除承認
    #[serde(rename = "write:approve_waiver")]
    ApproveLocalWaiver,
    /// 是正命令の発行
    #[serde(rename = "write:corrective_order")]
    IssueCorrectiveOrder,
    /// 規程改定の承認
    #[serde(rename = "write:approve_policy")]
    ApprovePolicyAmendment,
    /// アーカイブの承認
    #[serde(rename = "write:approve_archival")]
    ApproveArchival,
    /// 評価スキーマ管理
    #[serde(rename = "system:manage_schema")]
    ManageRubricSchema,
    /// ワークフロー管理
    #[serde(rename = "system:manage_workflows")]
    ManageWorkflows,
}

impl Permission {
    /// すべての権限
    pub const ALL: [Permission; 20] = [
        Permission::ViewHqDashboard,
        Permission::ViewRegionalDashboard,
        Permission::ViewSquadronDashboard,
        Permission::ViewCadetDashboard,
        Permission::ViewParentDashboard,
        Permission::ViewAllFinancials,
        Permission::ViewAuditedFinancials,
        Permission::ViewPiiSensitive,
        Permission::ViewOwnPortfolio,
        Permission::ViewLocalSquadronData,
        Permission::ExecuteFinancialDisbursement,
        Permission::ScoreArtifact,
        Permission::AttestSafetyOpsec,
        Permission::UpdateOwnPortfolio,
        Permission::ApproveLocalWaiver,
        Permission::IssueCorrectiveOrder,
        Permission::ApprovePolicyAmendment,
        Permission::ApproveArchival,
        Permission::ManageRubricSchema,
        Permission::ManageWorkflows,
    ];
}

/// 操作ごとの許可ロール集合（空集合は作れない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// ロール列から集合を作成する
    ///
    /// # Returns
    /// * `Ok(RoleSet)` - 1つ以上のロールを含む集合
    /// * `Err(CommonError::Validation)` - 空の場合
    pub fn new<I>(roles: I) -> Result<Self, CommonError>
    where
        I: IntoIterator<Item = Role>,
    {
        let set: BTreeSet<Role> = roles.into_iter().collect();
        if set.is_empty() {
            return Err(CommonError::Validation(
                "required role set must not be empty".to_string(),
            ));
        }
        Ok(Self(set))
    }

    /// 単一ロールのみを許可する集合
    pub fn only(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    /// 全ロールを許可する集合（認証済みであれば可）
    pub fn any() -> Self {
        Self(Role::ALL.into_iter().collect())
    }

    /// 指定権限を保持するすべてのロールの集合
    pub fn granting(permission: Permission) -> Self {
        // Adminは全権限を持つため、集合が空になることはない
        Self(
            Role::ALL
                .into_iter()
                .filter(|role| role.has_permission(permission))
                .collect(),
        )
    }

    /// 完全一致でのメンバーシップ判定
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// 集合内のロール（昇順）
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// 監査ログ用の文字列リスト
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|role| role.as_str()).collect()
    }
}

/// アイデンティティの種別（トークン有効期限ポリシーの選択に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// 環境変数で設定されたスーパーユーザー
    Superuser,
    /// DBに永続化されたユーザー
    Persisted,
}

/// 認証対象のアイデンティティ
///
/// レスポンスには直接シリアライズしない。`Debug`はパスワードハッシュを伏せる。
#[derive(Clone)]
pub struct Identity {
    /// アイデンティティID（0はスーパーユーザー）
    pub id: i64,
    /// ハンドル（ユーザー名、小文字）
    pub handle: String,
    /// メールアドレス
    pub email: Option<String>,
    /// パスワードハッシュ（bcrypt）
    pub password_hash: String,
    /// ロール
    pub role: Role,
    /// 種別
    pub kind: IdentityKind,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("kind", &self.kind)
            .finish()
    }
}

/// JWTクレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// アイデンティティID
    pub user_id: i64,
    /// ハンドル
    pub username: String,
    /// ロール
    pub role: Role,
    /// 発行日時（Unix timestamp）
    pub iat: usize,
    /// 有効期限（Unix timestamp、JWT exp claim）
    pub exp: usize,
}

/// ハンドルを照合用に正規化（前後空白除去・小文字化）
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().to_lowercase()
}
