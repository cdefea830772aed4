//! # ドメイン層エラー定義
//!
//! 値オブジェクトの検証失敗などドメイン固有の例外状態を表現する。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **配信処理は落とさない**: 配信ループでは本エラーを監査ログに変換し、
//!   呼び出し元へ伝播させない（失敗の封じ込めは受信者単位）
//!
//! ## 使用例
//!
//! ```rust
//! use herald_domain::DomainError;
//!
//! fn validate_address(value: &str) -> Result<(), DomainError> {
//!     if value.is_empty() {
//!         return Err(DomainError::Validation(
//!             "メールアドレスは必須です".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// 値オブジェクト構築やターゲット検証の失敗を表現する。
/// 配信ループはこのエラーを受け取り、該当受信者のスキップとログ記録に変換する。
///
/// # 設計判断
///
/// - `thiserror` を使用し、`std::error::Error` トレイトを自動実装
/// - 各バリアントに `#[error(...)]` で人間可読なメッセージを定義
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - メールアドレスの形式不正
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
