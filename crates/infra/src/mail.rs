//! # メール送信
//!
//! レンダリング済みメールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **3 つの実装**: SMTP（Mailpit 開発用）、SES（本番用）、Noop（テスト用）
//! - **環境変数切替**: `HERALD_MAIL_BACKEND` でランタイム選択。
//!   未知の値は Noop にフォールバックする（誤設定で誤送信しない）

mod noop;
mod ses;
mod smtp;

use std::{env, sync::Arc};

use async_trait::async_trait;
use herald_domain::message::{OutboundEmail, TransportError};
pub use noop::NoopMailTransport;
pub use ses::SesMailTransport;
pub use smtp::SmtpMailTransport;

/// メール送信トレイト
///
/// 配信基盤の中核。メール送信の具体的な方法を抽象化する。
/// SMTP / SES / Noop の 3 実装を環境変数で切り替える。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを送信する
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}

/// メール送信バックエンド
///
/// 環境変数 `HERALD_MAIL_BACKEND` で切り替える。
/// 値が未設定または不正な場合は [`Noop`](MailBackend::Noop) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    /// SMTP サーバー経由で送信（Mailpit 開発 / SMTP リレー）
    Smtp,
    /// Amazon SES v2 経由で送信（本番）
    Ses,
    /// 送信しない（ログ出力のみ）
    #[default]
    Noop,
}

impl MailBackend {
    /// 文字列からバックエンドをパースする
    ///
    /// 不正な値の場合は [`Noop`](MailBackend::Noop) にフォールバックし、
    /// stderr に警告を出力する。
    pub fn parse(s: &str) -> Self {
        match s {
            "smtp" => Self::Smtp,
            "ses" => Self::Ses,
            "noop" => Self::Noop,
            other => {
                eprintln!("WARNING: unknown HERALD_MAIL_BACKEND={other:?}, falling back to noop");
                Self::Noop
            }
        }
    }

    /// 環境変数 `HERALD_MAIL_BACKEND` から読み取る
    ///
    /// 未設定の場合は [`Noop`](MailBackend::Noop) をデフォルトとする。
    pub fn from_env() -> Self {
        match env::var("HERALD_MAIL_BACKEND") {
            Ok(val) => Self::parse(&val),
            Err(_) => Self::default(),
        }
    }
}

/// メール送信の設定
///
/// `HERALD_MAIL_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: Mailpit（開発）/ SMTP サーバー経由で送信
/// - `ses`: Amazon SES v2 経由で送信（本番）
/// - `noop`: 送信しない（ログ出力のみ・デフォルト）
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// 送信バックエンド
    pub backend:      MailBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
    /// 送信元メールアドレス
    pub from_address: String,
}

impl MailConfig {
    /// 環境変数からメール設定を読み込む
    pub fn from_env() -> Self {
        Self {
            backend:      MailBackend::from_env(),
            smtp_host:    env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port:    env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .expect("SMTP_PORT は有効なポート番号である必要があります"),
            from_address: env::var("HERALD_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@herald.example.com".to_string()),
        }
    }
}

/// 設定からメール送信インスタンスを構築する
///
/// SES バックエンドの場合は AWS SDK のデフォルト設定
/// （環境変数・IAM ロール・プロファイル）でクライアントを構築する。
pub async fn from_config(config: &MailConfig) -> Arc<dyn MailTransport> {
    match config.backend {
        MailBackend::Smtp => Arc::new(SmtpMailTransport::new(
            &config.smtp_host,
            config.smtp_port,
            config.from_address.clone(),
        )),
        MailBackend::Ses => {
            let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_sesv2::Client::new(&sdk_config);
            Arc::new(SesMailTransport::new(client, config.from_address.clone()))
        }
        MailBackend::Noop => Arc::new(NoopMailTransport),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // ===== MailBackend::parse テスト =====

    #[test]
    fn test_parse_smtpでsmtpを返す() {
        assert_eq!(MailBackend::parse("smtp"), MailBackend::Smtp);
    }

    #[test]
    fn test_parse_sesでsesを返す() {
        assert_eq!(MailBackend::parse("ses"), MailBackend::Ses);
    }

    #[test]
    fn test_parse_noopでnoopを返す() {
        assert_eq!(MailBackend::parse("noop"), MailBackend::Noop);
    }

    #[test]
    fn test_parse_不正な値でnoopにフォールバックする() {
        assert_eq!(MailBackend::parse("sendmail"), MailBackend::Noop);
        assert_eq!(MailBackend::parse(""), MailBackend::Noop);
        assert_eq!(MailBackend::parse("SMTP"), MailBackend::Noop);
    }

    // ===== MailBackend::default テスト =====

    #[test]
    fn test_defaultでnoopを返す() {
        assert_eq!(MailBackend::default(), MailBackend::Noop);
    }

    // ===== from_config テスト =====

    #[tokio::test]
    async fn test_noop設定でトランスポートを構築できる() {
        let config = MailConfig {
            backend:      MailBackend::Noop,
            smtp_host:    "localhost".to_string(),
            smtp_port:    1025,
            from_address: "noreply@herald.example.com".to_string(),
        };

        let transport = from_config(&config).await;

        let email = OutboundEmail {
            to:        "test@example.com".to_string(),
            subject:   "テスト件名".to_string(),
            html_body: "<p>テスト</p>".to_string(),
            text_body: "テスト".to_string(),
        };
        assert!(transport.send(&email).await.is_ok());
    }
}
