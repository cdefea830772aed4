//! # 配信ループ
//!
//! 解決済みの受信者を順に処理し、レンダリングと送信の結果を
//! 監査ログに記録する。
//!
//! ## 設計方針
//!
//! - **ベストエフォート配信 + 完全な監査証跡**: `send_all()` は集約結果を
//!   返さない。契約はログの木であり、全受信者の成否がそこに残る
//! - **失敗の封じ込めは受信者単位**: 検証・本文描画・送信のどの失敗も
//!   該当受信者の中止に留まり、バッチは継続する。プロセスや他の
//!   メッセージには何も波及しない
//! - **逐次処理**: 受信者は解決順に 1 人ずつ処理する。ログの木が
//!   読みやすい監査証跡になることを、並列化より優先する
//! - **バッチ内の重複スキップ**: 正規化済みアドレスが同一バッチ内で
//!   送信済みなら info を記録してスキップする。呼び出しを跨ぐ抑止は
//!   しない（重複防止は外部コラボレーターの責務）

use std::{collections::HashSet, sync::Arc};

use herald_domain::{
    audit_log::LogEntryId,
    context::DispatchContext,
    delivery::DeliveryState,
    message::{MessageConfig, OutboundEmail},
    recipient::RecipientTarget,
};
use herald_infra::{dispatch_log::DispatchLog, mail::MailTransport};
use herald_shared::{
    event_log::{error as error_fields, event},
    log_business_event,
};

use crate::{renderer::MessageRenderer, resolver::RecipientResolver};

/// 配信ディスパッチャ
///
/// イベント発火ごとに `send_all()` が呼ばれ、受信者解決 → 受信者ごとの
/// レンダリング → 送信を統合する。
pub struct Dispatcher {
    resolver:  RecipientResolver,
    renderer:  MessageRenderer,
    transport: Arc<dyn MailTransport>,
    log:       Arc<dyn DispatchLog>,
}

impl Dispatcher {
    pub fn new(
        resolver: RecipientResolver,
        renderer: MessageRenderer,
        transport: Arc<dyn MailTransport>,
        log: Arc<dyn DispatchLog>,
    ) -> Self {
        Self {
            resolver,
            renderer,
            transport,
            log,
        }
    }

    /// メッセージ設定を解決済みの全受信者に配信する
    ///
    /// エラーを返さない。受信者 0 件は正常（空グループなど）として
    /// 静かに終了し、フェイルクローズ時の警告/エラーは解決器が記録済み。
    /// 個々の受信者の成否はログの木と business event で追跡する。
    pub async fn send_all(&self, message: &MessageConfig, event: &DispatchContext) {
        let log = self.log.as_ref();
        let root = log.info(
            format!(
                "メッセージ配信を開始します（受信者設定: {}）",
                message.recipients().type_name()
            ),
            None,
        );

        let targets = self
            .resolver
            .resolve(message.recipients(), event, log, &root)
            .await;
        if targets.is_empty() {
            return;
        }

        // バッチ内で送信済みの正規化アドレス
        let mut dispatched: HashSet<String> = HashSet::new();

        for target in &targets {
            self.dispatch_one(message, event, target, &mut dispatched, &root)
                .await;
        }
    }

    /// 受信者 1 人分の検証 → 描画 → 送信
    async fn dispatch_one(
        &self,
        message: &MessageConfig,
        event: &DispatchContext,
        target: &RecipientTarget,
        dispatched: &mut HashSet<String>,
        root: &LogEntryId,
    ) {
        let log = self.log.as_ref();
        let state = advance(DeliveryState::Pending, DeliveryState::Validating);

        // 検証: 配信先アドレスの適格性（純関数）
        let address = match target.delivery_address() {
            Ok(address) => address,
            Err(e) => {
                let state = advance(state, DeliveryState::Rejected);
                log.warning(
                    format!("配信先が不正です（{}）: {e}", target.describe()),
                    Some(root),
                );
                log.error(
                    format!("{} にはメールを送信しませんでした", target.describe()),
                    Some(root),
                );
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::RECIPIENT_REJECTED,
                    event.entity_type = event::entity_type::RECIPIENT,
                    event.result = event::result::FAILURE,
                    event.recipient = %target.describe(),
                    delivery.state = %state,
                    "配信先を拒否"
                );
                return;
            }
        };

        // バッチ内重複スキップ（呼び出しを跨ぐ抑止はしない）
        if !dispatched.insert(address.normalized()) {
            log.info(
                format!("{address} へは同一配信内で送信済みのためスキップしました"),
                Some(root),
            );
            log_business_event!(
                event.category = event::category::DISPATCH,
                event.action = event::action::RECIPIENT_SKIPPED,
                event.entity_type = event::entity_type::RECIPIENT,
                event.result = event::result::SUCCESS,
                event.recipient = %target.describe(),
                "重複受信者をスキップ"
            );
            return;
        }

        let state = advance(state, DeliveryState::Rendering);

        // 受信者ごとに独立した拡張コンテキストで描画する
        let context = event.with_recipient(target);
        let subject = self.renderer.render_subject(message, &context, log, root);
        let body = match self.renderer.render_body(message, &context) {
            Ok(body) => body,
            Err(e) => {
                let state = advance(state, DeliveryState::RenderFailed);
                log.warning(format!("本文の描画に失敗しました: {e}"), Some(root));
                log.error(
                    format!("{address} にはメールを送信しませんでした"),
                    Some(root),
                );
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MESSAGE_RENDER_FAILED,
                    event.entity_type = event::entity_type::MESSAGE,
                    event.result = event::result::FAILURE,
                    event.recipient = %target.describe(),
                    delivery.state = %state,
                    error = %e,
                    "本文テンプレートのレンダリングに失敗"
                );
                return;
            }
        };

        let state = advance(state, DeliveryState::Dispatching);

        let email = OutboundEmail {
            to:        address.as_str().to_string(),
            subject:   subject.clone(),
            html_body: body.clone(),
            text_body: body,
        };

        match self.transport.send(&email).await {
            Ok(()) => {
                let state = advance(state, DeliveryState::Sent);
                log.success(
                    format!("{address} に「{subject}」を送信しました"),
                    Some(root),
                );
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MESSAGE_SENT,
                    event.entity_type = event::entity_type::MESSAGE,
                    event.result = event::result::SUCCESS,
                    event.recipient = %target.describe(),
                    delivery.state = %state,
                    "メール送信成功"
                );
            }
            Err(e) => {
                let state = advance(state, DeliveryState::SendFailed);
                tracing::error!(
                    error.category = error_fields::category::EXTERNAL_SERVICE,
                    error.kind = error_fields::kind::MAIL_TRANSPORT,
                    "メール送信に失敗: {}",
                    e
                );
                log.warning(
                    format!("メールトランスポートが失敗しました（設定を確認してください）: {e}"),
                    Some(root),
                );
                log.error(
                    format!("{address} にはメールを送信しませんでした"),
                    Some(root),
                );
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MESSAGE_FAILED,
                    event.entity_type = event::entity_type::MESSAGE,
                    event.result = event::result::FAILURE,
                    event.recipient = %target.describe(),
                    delivery.state = %state,
                    error = %e,
                    "メール送信失敗"
                );
            }
        }
    }
}

/// ステートを遷移させる（不正な遷移はデバッグビルドで検出）
fn advance(from: DeliveryState, to: DeliveryState) -> DeliveryState {
    debug_assert!(
        from.can_transition_to(to),
        "不正な配信ステート遷移: {from} → {to}"
    );
    to
}
