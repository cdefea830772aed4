//! # テスト用モック実装
//!
//! 配信テストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! herald-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_domain::{
    group::GroupId,
    message::{OutboundEmail, TransportError},
    user::User,
};

use crate::{
    directory::{Directory, GroupRegistry, UserFilter},
    error::DirectoryError,
    mail::MailTransport,
};

// ===== MockMailTransport =====

/// テスト用のモック MailTransport
///
/// 送信されたメールを記録する。`fail_with` で失敗を注入すると、
/// 以降の `send` は記録せずにエラーを返す。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:    Arc<Mutex<Vec<OutboundEmail>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            sent:    Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// 以降の送信を指定メッセージで失敗させる
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// 送信されたメールを送信順で返す
    pub fn sent_emails(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(TransportError::SendFailed(message));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== FailingDirectory =====

/// テスト用の常に失敗するディレクトリ
///
/// バックエンド障害時のフェイルクローズ動作を検証するために使用する。
/// `Directory` と `GroupRegistry` の両方を実装し、常にバックエンド
/// エラーを返す。
#[derive(Clone, Default)]
pub struct FailingDirectory;

impl FailingDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Directory for FailingDirectory {
    async fn find_users(&self, _filter: &UserFilter) -> Result<Vec<User>, DirectoryError> {
        Err(DirectoryError::backend("ディレクトリに接続できません"))
    }
}

#[async_trait]
impl GroupRegistry for FailingDirectory {
    async fn list_group_ids(&self) -> Result<Vec<GroupId>, DirectoryError> {
        Err(DirectoryError::backend("グループ一覧を取得できません"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_mail_transportが送信メールを記録する() {
        let transport = MockMailTransport::new();
        let email = OutboundEmail {
            to:        "test@example.com".to_string(),
            subject:   "テスト件名".to_string(),
            html_body: "<p>テスト</p>".to_string(),
            text_body: "テスト".to_string(),
        };

        transport.send(&email).await.unwrap();

        let sent = transport.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "test@example.com");
    }

    #[tokio::test]
    async fn mock_mail_transportは失敗を注入できる() {
        let transport = MockMailTransport::new();
        transport.fail_with("接続拒否");

        let email = OutboundEmail {
            to:        "test@example.com".to_string(),
            subject:   "テスト件名".to_string(),
            html_body: String::new(),
            text_body: String::new(),
        };

        let result = transport.send(&email).await;
        assert!(matches!(result, Err(TransportError::SendFailed(msg)) if msg == "接続拒否"));
        assert!(transport.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn failing_directoryは常にバックエンドエラーを返す() {
        let directory = FailingDirectory::new();

        assert!(directory.find_users(&UserFilter::All).await.is_err());
        assert!(directory.list_group_ids().await.is_err());
    }
}
