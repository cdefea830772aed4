//! # メッセージレンダリング
//!
//! 受信者 1 人分のコンテキストに対して件名と本文を描画する。
//!
//! ## 設計方針
//!
//! - **件名は失敗しない**: 描画に失敗しても配信は中止せず、テンプレート
//!   文字列そのものにフォールバックする。意図に近い件名のメールが届く
//!   ほうが、届かないよりよい
//! - **本文の失敗は該当受信者のみ致命的**: フォールバック本文は作らず、
//!   エラーを呼び出し元に返す。配信ループがその受信者だけを中止する
//! - **スコープの分離**: 件名は主オブジェクトスコープ（`entry` 等の
//!   フィールドを修飾なしで参照可）、本文は常にコンテキストスコープ。
//!   2 つの描画入口は折り畳まない（優先順位付きの主オブジェクト検出は
//!   挙動の契約）

use std::sync::Arc;

use herald_domain::{
    audit_log::LogEntryId,
    context::DispatchContext,
    message::{MessageConfig, RenderError},
};
use herald_infra::{dispatch_log::DispatchLog, template::TemplateEngine};

/// メッセージレンダラー
///
/// テンプレートエンジンを注入され、件名・本文の描画規則
/// （スコープ選択・フォールバック・トリミング）を適用する。
pub struct MessageRenderer {
    engine: Arc<dyn TemplateEngine>,
}

impl MessageRenderer {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    /// 件名を描画する（失敗しない）
    ///
    /// コンテキストに主オブジェクト（`entry` → `user` → `asset` の優先順）が
    /// あればオブジェクトスコープ、なければコンテキストスコープで描画する。
    /// 描画に失敗した場合は警告を記録し、件名テンプレート文字列そのものに
    /// フォールバックする。戻り値は前後の空白を除去済み。
    pub fn render_subject(
        &self,
        config: &MessageConfig,
        context: &DispatchContext,
        log: &dyn DispatchLog,
        parent: &LogEntryId,
    ) -> String {
        let result = match context.primary_object() {
            Some((_, object)) => self
                .engine
                .render_object_scoped(config.subject(), object, context),
            None => self.engine.render(config.subject(), context),
        };

        match result {
            Ok(rendered) => rendered.trim().to_string(),
            Err(e) => {
                log.warning(
                    format!("件名の描画に失敗したため、テンプレート文字列をそのまま使用します: {e}"),
                    Some(parent),
                );
                config.subject().trim().to_string()
            }
        }
    }

    /// 本文を描画する
    ///
    /// 常にコンテキストスコープで描画する（オブジェクトスコープにしない）。
    /// 失敗は該当受信者の配信中止としてそのまま返す。成功時の戻り値は
    /// 前後の空白を除去済み。
    pub fn render_body(
        &self,
        config: &MessageConfig,
        context: &DispatchContext,
    ) -> Result<String, RenderError> {
        let rendered = self.engine.render(config.template(), context)?;
        Ok(rendered.trim().to_string())
    }
}
