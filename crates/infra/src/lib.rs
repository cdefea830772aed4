//! # Herald インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートは配信処理が依存するインターフェース（ディレクトリ・
//! テンプレートエンジン・メールトランスポート・配信ログ）の定義と
//! 具体的な実装を提供する。外部システムの詳細をカプセル化し、
//! 配信ロジックをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **ユーザーディレクトリ**: ユーザー・グループ情報の照会
//! - **テンプレート描画**: Tera によるメッセージテンプレートの描画
//! - **メール送信**: SMTP / Amazon SES / Noop バックエンドの切り替え
//! - **配信ログ**: 配信処理の監査証跡の記録
//!
//! ## 依存関係
//!
//! ```text
//! core → infra → domain
//! ```
//!
//! インフラ層は `domain` にのみ依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`directory`] - ユーザーディレクトリとグループレジストリ
//! - [`dispatch_log`] - 配信ログの記録
//! - [`error`] - インフラ層エラー定義
//! - [`mail`] - メールトランスポート実装
//! - [`template`] - テンプレートエンジン実装
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use herald_infra::mail::{self, MailConfig};
//!
//! async fn setup() {
//!     // 環境変数からメールバックエンドを選択
//!     let config = MailConfig::from_env();
//!     let transport = mail::from_config(&config).await;
//! }
//! ```

pub mod directory;
pub mod dispatch_log;
pub mod error;
pub mod mail;
pub mod template;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{DirectoryError, DirectoryErrorKind};
