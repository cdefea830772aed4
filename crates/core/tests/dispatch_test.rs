//! 配信パイプラインの統合テスト
//!
//! 受信者解決 → 受信者ごとのレンダリング → 送信 → ログ記録を、
//! インメモリのコラボレーター一式で一気通貫に検証する。

use std::sync::Arc;

use herald_core::{Dispatcher, MessageRenderer, RecipientResolver};
use herald_domain::{
    audit_log::LogLevel,
    context::DispatchContext,
    group::Group,
    message::MessageConfig,
    user::{EmailAddress, User, UserId, UserName},
};
use herald_infra::{
    directory::{InMemoryDirectory, InMemoryGroupRegistry},
    dispatch_log::InMemoryDispatchLog,
    mock::MockMailTransport,
    template::{TemplateEngine, TeraTemplateEngine},
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// インメモリコラボレーター一式を束ねたテストハーネス
///
/// 各フィールドは `Dispatcher` に渡したインスタンスと内部状態を
/// 共有しており、配信後の検証に使える。
struct DispatchHarness {
    directory:  InMemoryDirectory,
    registry:   InMemoryGroupRegistry,
    transport:  MockMailTransport,
    log:        InMemoryDispatchLog,
    dispatcher: Dispatcher,
}

impl DispatchHarness {
    fn new() -> Self {
        Self::with_engine(TeraTemplateEngine::new())
    }

    fn with_engine(engine: TeraTemplateEngine) -> Self {
        let engine: Arc<dyn TemplateEngine> = Arc::new(engine);
        let directory = InMemoryDirectory::new();
        let registry = InMemoryGroupRegistry::new();
        let transport = MockMailTransport::new();
        let log = InMemoryDispatchLog::new();

        let dispatcher = Dispatcher::new(
            RecipientResolver::new(
                Arc::new(directory.clone()),
                Arc::new(registry.clone()),
                engine.clone(),
            ),
            MessageRenderer::new(engine),
            Arc::new(transport.clone()),
            Arc::new(log.clone()),
        );

        Self {
            directory,
            registry,
            transport,
            log,
            dispatcher,
        }
    }

    fn add_user(&self, name: &str, email: &str, admin: bool) -> User {
        let user = User::new(
            UserId::new(),
            UserName::new(name).unwrap(),
            Some(EmailAddress::new(email).unwrap()),
            admin,
        );
        self.directory.add_user(user.clone());
        user
    }

    fn add_group_with_member(&self, name: &str, member: &User) {
        let group = Group::with_name(name).unwrap();
        self.directory
            .assign_group(group.id().clone(), member.id().clone());
        self.registry.add_group(group);
    }
}

fn simple_config(recipients: serde_json::Value) -> MessageConfig {
    MessageConfig::from_value(&json!({
        "template": "本文",
        "subject": "件名",
        "recipients": recipients,
    }))
}

#[tokio::test]
async fn test_all_adminsは管理者のみにディレクトリ順で送信する() {
    // Arrange: 管理者 2 名 + 一般ユーザー 1 名
    let harness = DispatchHarness::new();
    harness.add_user("管理者 一郎", "admin1@example.com", true);
    harness.add_user("一般 二郎", "user2@example.com", false);
    harness.add_user("管理者 三子", "admin3@example.com", true);

    let config = simple_config(json!({"type": "all-admins"}));

    // Act
    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    // Assert: 管理者 2 名だけに、登録順で送信される
    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "admin1@example.com");
    assert_eq!(sent[1].to, "admin3@example.com");
}

#[tokio::test]
async fn test_未知の受信者タイプは何も送信せず警告とエラーを記録する() {
    let harness = DispatchHarness::new();
    harness.add_user("管理者 一郎", "admin1@example.com", true);

    // 旧設計の予約タイプ specific-users は削除済みで、未知タイプとして扱われる
    let config = simple_config(json!({"type": "specific-users", "ids": ["u1"]}));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    assert!(harness.transport.sent_emails().is_empty());
    let entries = harness.log.entries();
    assert!(entries.iter().any(|e| e.level == LogLevel::Warning));
    assert!(entries.iter().any(|e| e.level == LogLevel::Error));
}

#[tokio::test]
async fn test_グループall指定は配信時点のグループ一覧を反映する() {
    let harness = DispatchHarness::new();
    let taro = harness.add_user("営業 太郎", "taro@example.com", false);
    harness.add_group_with_member("営業部", &taro);

    let config = simple_config(json!({"type": "users-in-groups", "groupIds": "ALL"}));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;
    assert_eq!(harness.transport.sent_emails().len(), 1);

    // 発火の間に増えたグループは、次の配信で即座に対象になる（キャッシュなし）
    let jiro = harness.add_user("開発 次郎", "jiro@example.com", false);
    harness.add_group_with_member("開発部", &jiro);

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].to, "taro@example.com");
    assert_eq!(sent[2].to, "jiro@example.com");
}

#[tokio::test]
async fn test_custom_emailsはデコード順のとおりに送信する() {
    let harness = DispatchHarness::new();
    let config = simple_config(json!({
        "type": "custom-emails",
        "snippet": r#"["b@y.com", "a@x.com"]"#,
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "b@y.com");
    assert_eq!(sent[1].to, "a@x.com");
}

#[tokio::test]
async fn test_不正な生アドレスはスキップされ後続の受信者には送信される() {
    let harness = DispatchHarness::new();
    let config = simple_config(json!({
        "type": "custom-emails",
        "snippet": r#"["not-an-email", "after@example.com"]"#,
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    // 不正アドレスには何も送らず、後続には届く
    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "after@example.com");

    let entries = harness.log.entries();
    assert!(
        entries
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("not-an-email"))
    );
    assert!(entries.iter().any(|e| e.level == LogLevel::Error));
}

#[tokio::test]
async fn test_件名の描画失敗でも配信は続行しテンプレート文字列が件名になる() {
    let harness = DispatchHarness::new();
    let config = MessageConfig::from_value(&json!({
        "template": "本文",
        "subject": "{{ undefined_subject }}",
        "recipients": {
            "type": "custom-emails",
            "snippet": r#"["a@x.com"]"#,
        },
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "{{ undefined_subject }}");

    let entries = harness.log.entries();
    assert!(
        entries
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("件名の描画に失敗"))
    );
}

#[tokio::test]
async fn test_本文の描画失敗は該当受信者だけを中止する() {
    let harness = DispatchHarness::new();
    // 最初の受信者でだけ未定義変数を評価させ、本文描画を失敗させる
    let config = MessageConfig::from_value(&json!({
        "template": "{% if recipient == \"bad@x.com\" %}{{ boom }}{% endif %}通知本文",
        "subject": "件名",
        "recipients": {
            "type": "custom-emails",
            "snippet": r#"["bad@x.com", "good@y.com"]"#,
        },
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "good@y.com");
    assert_eq!(sent[0].html_body, "通知本文");

    let entries = harness.log.entries();
    assert!(
        entries
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("本文の描画に失敗"))
    );
}

#[tokio::test]
async fn test_同一引数で2回配信すると2回送信される() {
    // 呼び出しを跨ぐ重複抑止はしない（重複防止は外部コラボレーターの責務）
    let harness = DispatchHarness::new();
    let config = simple_config(json!({
        "type": "custom-emails",
        "snippet": r#"["repeat@example.com"]"#,
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;
    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "repeat@example.com");
    assert_eq!(sent[1].to, "repeat@example.com");
}

#[tokio::test]
async fn test_発火ごとに1本のログの木が形成される() {
    let harness = DispatchHarness::new();
    let config = simple_config(json!({
        "type": "custom-emails",
        "snippet": r#"["a@x.com"]"#,
    }));

    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;
    harness
        .dispatcher
        .send_all(&config, &DispatchContext::new())
        .await;

    let entries = harness.log.entries();
    let roots: Vec<_> = entries.iter().filter(|e| e.is_root()).collect();
    assert_eq!(roots.len(), 2);

    // 各発火の成功エントリは、その発火のルートにぶら下がる
    let first_children = harness.log.children_of(&roots[0].id);
    let second_children = harness.log.children_of(&roots[1].id);
    assert_eq!(first_children.len(), 1);
    assert_eq!(first_children[0].level, LogLevel::Success);
    assert_eq!(second_children.len(), 1);
    assert_eq!(second_children[0].level, LogLevel::Success);
}

#[tokio::test]
async fn test_設定jsonから配信まで一気通貫で動作する() {
    // Arrange: 登録済みテンプレート + 管理者 1 名
    let mut engine = TeraTemplateEngine::new();
    engine
        .register_template(
            "entry_created",
            "{{ recipient.name }} さん\n記事「{{ entry.title }}」が公開されました。",
        )
        .unwrap();
    let harness = DispatchHarness::with_engine(engine);
    harness.add_user("編集 花子", "hanako@example.com", true);

    let config = MessageConfig::from_value(&json!({
        "template": "entry_created",
        "subject": "【{{ site_name }}】{{ title }}",
        "recipients": {"type": "all-admins"},
    }));
    let context = DispatchContext::from_value(&json!({
        "entry": {"title": "夏の新商品"},
        "site_name": "Herald Store",
    }));

    // Act
    harness.dispatcher.send_all(&config, &context).await;

    // Assert
    let sent = harness.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "hanako@example.com");
    // 件名はオブジェクトスコープ: entry.title を修飾なしで参照できる
    assert_eq!(sent[0].subject, "【Herald Store】夏の新商品");
    // 本文は recipient を拡張したコンテキストで描画され、HTML とテキストは同内容
    assert_eq!(
        sent[0].html_body,
        "編集 花子 さん\n記事「夏の新商品」が公開されました。"
    );
    assert_eq!(sent[0].html_body, sent[0].text_body);
}
