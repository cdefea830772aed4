//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! テスト環境や配信無効化時に使用する。

use async_trait::async_trait;
use herald_domain::message::{OutboundEmail, TransportError};

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
