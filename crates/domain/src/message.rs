//! # メッセージ設定と送信メール
//!
//! オペレーターが保存するメッセージ設定（[`MessageConfig`]）と、
//! レンダリング済みの送信メール（[`OutboundEmail`]）を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`MessageConfig`] | メッセージ設定 | 件名・本文テンプレート + 受信者設定。配信中は不変 |
//! | [`OutboundEmail`] | 送信メール | レンダリング出力。MailTransport に渡される |
//! | [`RenderError`] | レンダリングエラー | 本文の失敗は該当受信者のみ致命的 |
//! | [`TransportError`] | 送信エラー | 送信失敗。バッチは継続する |
//!
//! ## 設計方針
//!
//! - **パースは寛容**: `MessageConfig::from_value` は失敗しない。
//!   欠落・型違いのフィールドは空文字列 / `Unknown` に落とし、
//!   後段（レンダリング・解決）で安全に縮退させる
//! - **テンプレート分離**: 設定はテンプレート文字列を保持するだけで、
//!   レンダリング方法（登録済み名 or インライン）は TemplateEngine が決める

use serde_json::Value;
use thiserror::Error;

use crate::recipient::RecipientSpec;

/// レンダリングエラー
///
/// 件名レンダリングではフォールバックに吸収され、
/// 本文レンダリングでは該当受信者の配信中止として呼び出し元に返る。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// テンプレートのレンダリングに失敗
    #[error("テンプレートのレンダリングに失敗: {0}")]
    Template(String),

    /// コンテキストをテンプレート入力に変換できなかった
    #[error("コンテキストの変換に失敗: {0}")]
    Context(String),
}

/// メール送信エラー
#[derive(Debug, Error)]
pub enum TransportError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// メールメッセージの構築に失敗（アドレス形式など）
    #[error("メールメッセージの構築に失敗: {0}")]
    BuildFailed(String),
}

/// 送信メール
///
/// レンダリングの出力。MailTransport に渡される。
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// メッセージ設定
///
/// イベント発火時に読み取られる宣言的な設定。配信中は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageConfig {
    /// 本文テンプレート参照（登録済みテンプレート名 or インラインソース）
    template:   String,
    /// 件名テンプレート文字列
    subject:    String,
    /// 受信者設定
    recipients: RecipientSpec,
}

impl MessageConfig {
    pub fn new(
        template: impl Into<String>,
        subject: impl Into<String>,
        recipients: RecipientSpec,
    ) -> Self {
        Self {
            template: template.into(),
            subject: subject.into(),
            recipients,
        }
    }

    /// 保存済み設定の JSON からメッセージ設定をパースする
    ///
    /// この関数は失敗しない（全域関数）。欠落・型違いのフィールドは
    /// 空文字列に、受信者設定は [`RecipientSpec::from_value`] の規則で
    /// `Unknown` に落ちる。
    pub fn from_value(value: &Value) -> Self {
        Self {
            template:   string_field(value, "template"),
            subject:    string_field(value, "subject"),
            recipients: RecipientSpec::from_value(value.get("recipients").unwrap_or(&Value::Null)),
        }
    }

    /// 本文テンプレート参照を取得する
    pub fn template(&self) -> &str {
        &self.template
    }

    /// 件名テンプレート文字列を取得する
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// 受信者設定を取得する
    pub fn recipients(&self) -> &RecipientSpec {
        &self.recipients
    }
}

/// 文字列フィールドを取り出す（欠落・型違いは空文字列）
fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
