//! # ユーザー
//!
//! ディレクトリ（外部ユーザーストア）が返すユーザー識別情報と、
//! それに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`User`] | ユーザー識別情報 | ディレクトリ検索の結果。配信対象の候補 |
//! | [`EmailAddress`] | メールアドレス | 配信可否判定の基準。構文検証済みの値のみ存在 |
//! | [`UserStatus`] | ユーザー状態 | 非アクティブユーザーはディレクトリ検索から除外される |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **メールアドレスは任意**: ディレクトリ上のユーザーが必ずしもアドレスを
//!   持つとは限らない。`Option<EmailAddress>` で欠落を型に表す
//! - **読み取り専用**: Herald はディレクトリへ書き込まない。エンティティは
//!   検索結果のスナップショットであり、ライフサイクル管理を持たない
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use herald_domain::user::{EmailAddress, User, UserId, UserName};
//!
//! let user = User::new(
//!     UserId::new(),
//!     UserName::new("山田太郎")?,
//!     Some(EmailAddress::new("yamada@example.com")?),
//!     false,
//! );
//!
//! assert!(user.is_active());
//! assert!(!user.is_admin());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    /// Newtype パターンで型安全性を確保。
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー表示名（値オブジェクト）
    ///
    /// ユーザーの表示名を表現する。
    /// PII（個人識別情報）のため、Debug 出力はマスクされる。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct UserName {
        label: "ユーザー名",
        max_length: 100,
        pii: true,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時に構文検証を実行し、不正な値の作成を防ぐ。
/// 配信対象の適格性判定はこの型の構築可否そのものである。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// メールアドレスを作成する
    ///
    /// 前後の空白は除去してから検証する。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式で、両側が空でない
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        // 基本的な構造検証: local@domain の形式であること
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }

    /// 重複判定用の正規化形式を返す（ASCII 小文字化）
    ///
    /// 配信ループの同一バッチ内重複スキップで使用する。
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーステータス
///
/// ディレクトリ上のユーザーの状態を表現する列挙型。
/// 非アクティブユーザーはディレクトリ検索の結果に現れない。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    /// アクティブ（配信対象）
    Active,
    /// 非アクティブ（配信対象外）
    Inactive,
}

/// ユーザー識別情報
///
/// ディレクトリ検索が返す配信対象候補。Herald からは読み取り専用で、
/// グループ所属はディレクトリ側が管理する（エンティティには持たせない）。
///
/// # 不変条件
///
/// - `status` が `Inactive` のユーザーはディレクトリ検索から除外される
/// - `email` が `None` のユーザーは配信不適格（検証段階で拒否・ログ記録）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:     UserId,
    name:   UserName,
    email:  Option<EmailAddress>,
    admin:  bool,
    status: UserStatus,
}

impl User {
    /// 新しいユーザー識別情報を作成する
    ///
    /// # 不変条件
    ///
    /// - 作成時のステータスは `Active`
    pub fn new(id: UserId, name: UserName, email: Option<EmailAddress>, admin: bool) -> Self {
        Self {
            id,
            name,
            email,
            admin,
            status: UserStatus::Active,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    // ビジネスロジックメソッド

    /// ユーザーが管理者か判定する
    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// ユーザーがアクティブか判定する
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// ステータスを変更した新しいインスタンスを返す
    pub fn with_status(self, status: UserStatus) -> Self {
        Self { status, ..self }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    // フィクスチャ

    #[fixture]
    fn active_user() -> User {
        User::new(
            UserId::new(),
            UserName::new("Test User").unwrap(),
            Some(EmailAddress::new("user@example.com").unwrap()),
            false,
        )
    }

    // EmailAddress のテスト

    #[test]
    fn test_メールアドレスは正常な形式を受け入れる() {
        assert!(EmailAddress::new("user@example.com").is_ok());
    }

    #[test]
    fn test_メールアドレスは前後の空白を除去する() {
        let address = EmailAddress::new("  user@example.com  ").unwrap();
        assert_eq!(address.as_str(), "user@example.com");
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    #[case("no-at-sign", "@記号なし")]
    #[case("@", "@のみ")]
    #[case("@example.com", "ローカル部分が空")]
    #[case("user@", "ドメイン部分が空")]
    #[case(&format!("{}@example.com", "a".repeat(256)), "255文字超過")]
    fn test_メールアドレスは不正な形式を拒否する(
        #[case] input: &str,
        #[case] _reason: &str,
    ) {
        assert!(EmailAddress::new(input).is_err());
    }

    #[test]
    fn test_正規化形式は小文字化される() {
        let address = EmailAddress::new("User@Example.COM").unwrap();
        assert_eq!(address.normalized(), "user@example.com");
    }

    // User のテスト

    #[rstest]
    fn test_新規ユーザーはアクティブ状態(active_user: User) {
        assert!(active_user.is_active());
    }

    #[rstest]
    fn test_ステータス変更後は非アクティブ(active_user: User) {
        let updated = active_user.with_status(UserStatus::Inactive);
        assert!(!updated.is_active());
    }

    #[rstest]
    fn test_管理者フラグを取得できる(active_user: User) {
        assert!(!active_user.is_admin());

        let admin = User::new(
            UserId::new(),
            UserName::new("Admin").unwrap(),
            Some(EmailAddress::new("admin@example.com").unwrap()),
            true,
        );
        assert!(admin.is_admin());
    }

    #[rstest]
    fn test_メールアドレスなしのユーザーを表現できる(active_user: User) {
        assert!(active_user.email().is_some());

        let without_email = User::new(
            UserId::new(),
            UserName::new("No Mail").unwrap(),
            None,
            false,
        );
        assert!(without_email.email().is_none());
    }

    #[test]
    fn test_ユーザー名のdebug出力はマスクされる() {
        let name = UserName::new("山田太郎").unwrap();
        assert!(format!("{name:?}").contains("[REDACTED]"));
    }
}
