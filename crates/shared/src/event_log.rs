//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! 配信結果を `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! 既存の `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.recipient`: 受信者の識別表現（PII に注意。ユーザーは ID で識別する）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const DISPATCH: &str = "dispatch";
    }

    /// イベントアクション
    pub mod action {
        // 配信（メッセージ単位）
        pub const MESSAGE_SENT: &str = "message.sent";
        pub const MESSAGE_FAILED: &str = "message.failed";
        pub const MESSAGE_RENDER_FAILED: &str = "message.render_failed";

        // 配信（受信者単位）
        pub const RECIPIENTS_RESOLVED: &str = "recipients.resolved";
        pub const RECIPIENT_REJECTED: &str = "recipient.rejected";
        pub const RECIPIENT_SKIPPED: &str = "recipient.skipped";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const MESSAGE: &str = "message";
        pub const RECIPIENT: &str = "recipient";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（ディレクトリ、グループレジストリ）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（SMTP、SES）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const DIRECTORY: &str = "directory";
        pub const GROUP_REGISTRY: &str = "group_registry";
        pub const MAIL_TRANSPORT: &str = "mail_transport";
        pub const TEMPLATE: &str = "template";
        pub const INTERNAL: &str = "internal";
    }
}
