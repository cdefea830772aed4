//! # 受信者設定と配信ターゲット
//!
//! オペレーターが保存する宣言的な受信者設定（[`RecipientSpec`]）と、
//! 解決後の具体的な配信先（[`RecipientTarget`]）を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`RecipientSpec`] | 受信者設定 | 閉じた enum。未知の `type` は明示的に `Unknown` へ落ちる |
//! | [`GroupSelection`] | グループ選択 | `"ALL"`（全グループ）または ID 集合 |
//! | [`RecipientTarget`] | 配信ターゲット | ユーザー識別情報 or 生メールアドレス文字列 |
//!
//! ## 設計方針
//!
//! - **パースは全域関数**: `RecipientSpec::from_value` は失敗しない。
//!   不正な入力は `Unknown` / `groups: None` に写像され、解決段階で
//!   フェイルクローズ（受信者 0 件 + 警告/エラーのログ対）になる。
//!   「送らないほうが誤送信よりまし」という方針の型表現
//! - **適格性は純関数**: 配信可否の判定は [`RecipientTarget`] のバリアントに
//!   対するパターンマッチのみで決まり、実行時型検査を持たない
//! - **`specific-users` / `specific-emails` は存在しない**: 旧設計で
//!   予約されていた 2 タイプは完全に削除した。該当文字列は `Unknown` に
//!   パースされ、フェイルクローズする

use serde_json::Value;

use crate::{
    DomainError,
    group::GroupId,
    user::{EmailAddress, User},
};

/// 受信者設定の `type` 文字列（ワイヤ形式、kebab-case）
const TYPE_ALL_USERS: &str = "all-users";
const TYPE_ALL_ADMINS: &str = "all-admins";
const TYPE_USERS_IN_GROUPS: &str = "users-in-groups";
const TYPE_CUSTOM_USERS: &str = "custom-users";
const TYPE_CUSTOM_EMAILS: &str = "custom-emails";

/// `users-in-groups` のグループ選択
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSelection {
    /// 解決時点で存在する全グループ（キャッシュせず、解決のたびに展開する）
    All,
    /// 指定されたグループ ID 集合
    Ids(Vec<GroupId>),
}

/// カスタム snippet の出力解釈
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomKind {
    /// JSON 配列をユーザー ID 列として解釈し、ディレクトリを検索する
    Users,
    /// JSON 配列をメールアドレス列として解釈する（ディレクトリ検索なし）
    Emails,
}

/// 受信者設定（閉じた enum）
///
/// 1 回の配信で有効なバリアントは常に 1 つ。
/// 未知の `type` は [`Unknown`](RecipientSpec::Unknown) に落ち、
/// 解決段階で受信者 0 件となる（フェイルクローズ）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientSpec {
    /// ディレクトリ上の全アクティブユーザー
    AllUsers,
    /// 管理者フラグを持つ全アクティブユーザー
    AllAdmins,
    /// 指定グループに所属するユーザーの和集合
    ///
    /// `groups: None` は `groupIds` の欠落・空・不正を表し、
    /// 解決時にフェイルクローズする。
    UsersInGroups { groups: Option<GroupSelection> },
    /// snippet をレンダリングして受信者リストを得る
    ///
    /// `snippet: None` は設定の欠落を表し、解決時にフェイルクローズする。
    Custom {
        kind:    CustomKind,
        snippet: Option<String>,
    },
    /// 未知または欠落した `type`
    ///
    /// デフォルトアーム。`raw` は設定に書かれていた `type` 文字列
    /// （欠落時は `None`）。
    Unknown { raw: Option<String> },
}

impl RecipientSpec {
    /// 保存済み設定の JSON から受信者設定をパースする
    ///
    /// この関数は失敗しない（全域関数）。不正・欠落した入力は
    /// `Unknown` または `groups: None` / `snippet: None` に写像され、
    /// 解決段階でフェイルクローズする。
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Unknown { raw: None };
        };

        match obj.get("type").and_then(Value::as_str) {
            Some(TYPE_ALL_USERS) => Self::AllUsers,
            Some(TYPE_ALL_ADMINS) => Self::AllAdmins,
            Some(TYPE_USERS_IN_GROUPS) => Self::UsersInGroups {
                groups: parse_group_selection(obj.get("groupIds")),
            },
            Some(TYPE_CUSTOM_USERS) => Self::Custom {
                kind:    CustomKind::Users,
                snippet: parse_snippet(obj.get("snippet")),
            },
            Some(TYPE_CUSTOM_EMAILS) => Self::Custom {
                kind:    CustomKind::Emails,
                snippet: parse_snippet(obj.get("snippet")),
            },
            // 未知タイプ（削除済みの specific-users / specific-emails を含む）は
            // 明示的にここへ落とす。省略ではなく設計（フェイルクローズ）
            other => Self::Unknown {
                raw: other.map(str::to_string),
            },
        }
    }

    /// ワイヤ形式の `type` 名を返す（ログ・イベント出力用）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AllUsers => TYPE_ALL_USERS,
            Self::AllAdmins => TYPE_ALL_ADMINS,
            Self::UsersInGroups { .. } => TYPE_USERS_IN_GROUPS,
            Self::Custom {
                kind: CustomKind::Users,
                ..
            } => TYPE_CUSTOM_USERS,
            Self::Custom {
                kind: CustomKind::Emails,
                ..
            } => TYPE_CUSTOM_EMAILS,
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// `groupIds` の値をパースする
///
/// - 文字列 `"ALL"` → 全グループ展開
/// - 空でない UUID 文字列の配列 → ID 集合
/// - それ以外（欠落・空配列・非 UUID 混入・型違い）→ `None`（フェイルクローズ）
fn parse_group_selection(value: Option<&Value>) -> Option<GroupSelection> {
    match value {
        Some(Value::String(s)) if s == "ALL" => Some(GroupSelection::All),
        Some(Value::Array(items)) if !items.is_empty() => {
            let ids: Option<Vec<GroupId>> = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .and_then(|s| uuid::Uuid::parse_str(s).ok())
                        .map(GroupId::from_uuid)
                })
                .collect();
            ids.map(GroupSelection::Ids)
        }
        _ => None,
    }
}

/// `snippet` の値をパースする（空白のみの snippet は欠落扱い）
fn parse_snippet(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// 解決済みの配信ターゲット
///
/// ディレクトリ由来のユーザー識別情報、または snippet 由来の
/// 生メールアドレス文字列。生文字列の構文検証は配信ループの
/// 検証段階まで遅延する（解決器は重複排除も検証もしない）。
#[derive(Debug, Clone, PartialEq)]
pub enum RecipientTarget {
    /// ディレクトリ上のユーザー
    User(User),
    /// 生メールアドレス文字列（未検証）
    Email(String),
}

impl RecipientTarget {
    /// 配信先アドレスを検証して返す（適格性判定の純関数）
    ///
    /// - `User`: メールアドレスが設定されていれば適格
    /// - `Email`: 構文的に有効なら適格
    ///
    /// # エラー
    ///
    /// 不適格なターゲットは `DomainError::Validation` を返す。
    /// 呼び出し元（配信ループ）は拒否をログに記録し、バッチを継続する。
    pub fn delivery_address(&self) -> Result<EmailAddress, DomainError> {
        match self {
            Self::User(user) => user.email().cloned().ok_or_else(|| {
                DomainError::Validation(format!(
                    "ユーザー {} にメールアドレスが設定されていません",
                    user.id()
                ))
            }),
            Self::Email(raw) => EmailAddress::new(raw.as_str()),
        }
    }

    /// ログ出力用の識別表現を返す
    ///
    /// ユーザー名は PII のため、ユーザーは ID で識別する。
    pub fn describe(&self) -> String {
        match self {
            Self::User(user) => format!("ユーザー {}", user.id()),
            Self::Email(raw) => raw.clone(),
        }
    }

    /// テンプレートコンテキストの `recipient` キーに入る値を構築する
    ///
    /// - `User`: `{ id, name, email, admin }` のオブジェクト
    /// - `Email`: アドレス文字列そのもの
    pub fn to_context_value(&self) -> Value {
        match self {
            Self::User(user) => serde_json::json!({
                "id": user.id(),
                "name": user.name(),
                "email": user.email(),
                "admin": user.is_admin(),
            }),
            Self::Email(raw) => Value::String(raw.clone()),
        }
    }
}
