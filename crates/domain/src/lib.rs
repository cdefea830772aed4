//! # Herald ドメイン層
//!
//! メール配信エンジンの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **値オブジェクト**: 検証済みの不変オブジェクト（例: [`user::EmailAddress`],
//!   [`group::GroupName`]）
//! - **受信者設定**: オペレーターが保存する宣言的な設定の閉じた enum
//!   （[`recipient::RecipientSpec`]）
//! - **配信の記録**: 木構造の監査ログ（[`audit_log::LogEntry`]）と
//!   受信者ごとのステートマシン（[`delivery::DeliveryState`]）
//! - **ドメインエラー**: 値オブジェクトの検証違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（SMTP、SES、テンプレートエンジン）には
//! 一切依存しない。これにより、配信ルールの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`recipient`] - 受信者設定と配信ターゲット
//! - [`message`] - メッセージ設定と送信メール
//! - [`context`] - 配信コンテキスト
//! - [`audit_log`] - 配信監査ログ
//! - [`delivery`] - 受信者ごとの配信ステート
//! - [`user`] / [`group`] - ディレクトリ上のエンティティ
//! - [`clock`] - 注入可能な時刻取得
//!
//! ## 使用例
//!
//! ```rust
//! use herald_domain::recipient::RecipientSpec;
//! use serde_json::json;
//!
//! // 保存済み設定のパースは失敗しない（不正値はフェイルクローズ）
//! let spec = RecipientSpec::from_value(&json!({"type": "all-admins"}));
//! assert_eq!(spec, RecipientSpec::AllAdmins);
//! ```

#[macro_use]
mod macros;

pub mod audit_log;
pub mod clock;
pub mod context;
pub mod delivery;
pub mod error;
pub mod group;
pub mod message;
pub mod recipient;
pub mod user;

pub use error::DomainError;
