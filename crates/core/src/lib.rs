//! # Herald コア
//!
//! イベント起点のメール配信エンジン。監視対象のドメインイベント
//! （記事の保存、ユーザー登録、アセットのアップロードなど）が発火したとき、
//! 宣言的な受信者設定を具体的な配信先に解決し、受信者ごとにメッセージを
//! 描画して、メールトランスポートへ引き渡す。
//!
//! ## 処理の流れ
//!
//! ```text
//! イベント発火
//!   → Dispatcher::send_all
//!     → RecipientResolver が配信ターゲット列を確定
//!     → ターゲットごとに: MessageRenderer が（件名, 本文）を描画
//!       → MailTransport::send
//!     → 結果を配信ログの木に記録
//! ```
//!
//! ## 設計方針
//!
//! - **フェイルクローズ**: 不正・未知の受信者設定は受信者 0 件に縮退する。
//!   誤送信より未送信を選ぶ
//! - **失敗の封じ込めは受信者単位**: 1 人の検証・描画・送信の失敗は
//!   その受信者の中止に留まり、バッチや他のメッセージには波及しない
//! - **監査証跡が契約**: `send_all()` は集約結果を返さない。発火ごとに
//!   1 本のログの木が残り、全受信者の成否を追跡できる
//!
//! ## 依存関係の方向
//!
//! ```text
//! core → infra → domain
//!   ↘ shared
//! ```
//!
//! バイナリターゲットは持たない。イベント購読層から
//! `(MessageConfig, DispatchContext)` を渡して呼び出される。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use herald_core::{Dispatcher, MessageRenderer, RecipientResolver};
//! use herald_domain::{context::DispatchContext, message::MessageConfig};
//! use herald_infra::{
//!     dispatch_log::InMemoryDispatchLog,
//!     mail::{self, MailConfig},
//!     template::TeraTemplateEngine,
//! };
//!
//! async fn on_entry_saved(directory: Arc<dyn herald_infra::directory::Directory>,
//!                         groups: Arc<dyn herald_infra::directory::GroupRegistry>,
//!                         saved_config: serde_json::Value,
//!                         payload: serde_json::Value) {
//!     let engine: Arc<dyn herald_infra::template::TemplateEngine> =
//!         Arc::new(TeraTemplateEngine::new());
//!     let transport = mail::from_config(&MailConfig::from_env()).await;
//!     let log = Arc::new(InMemoryDispatchLog::new());
//!
//!     let dispatcher = Dispatcher::new(
//!         RecipientResolver::new(directory, groups, engine.clone()),
//!         MessageRenderer::new(engine),
//!         transport,
//!         log,
//!     );
//!
//!     let message = MessageConfig::from_value(&saved_config);
//!     let context = DispatchContext::from_value(&payload);
//!     dispatcher.send_all(&message, &context).await;
//! }
//! ```

pub mod dispatcher;
pub mod renderer;
pub mod resolver;

pub use dispatcher::Dispatcher;
pub use renderer::MessageRenderer;
pub use resolver::RecipientResolver;
