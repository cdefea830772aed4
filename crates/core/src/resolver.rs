//! # 受信者解決
//!
//! 宣言的な受信者設定（[`RecipientSpec`]）を、具体的な配信ターゲット列に
//! 解決する。配信パイプラインの入口であり、ここで確定した列の順序が
//! そのまま配信順になる。
//!
//! ## 設計方針
//!
//! - **失敗しない**: `resolve()` はエラーを返さない。設定不備・ディレクトリ
//!   障害・snippet の描画失敗はすべて「空のターゲット列 + 警告/エラーの
//!   ログ対」に縮退する（フェイルクローズ。誤送信より未送信を選ぶ）
//! - **重複排除しない**: 解決器はターゲット列をそのまま返す。
//!   同一バッチ内の重複スキップは配信ループの責務
//! - **キャッシュしない**: `"ALL"` のグループ展開は解決のたびに
//!   グループレジストリへ問い合わせ、グループの増減を即座に反映する

use std::sync::Arc;

use herald_domain::{
    audit_log::LogEntryId,
    context::DispatchContext,
    recipient::{CustomKind, GroupSelection, RecipientSpec, RecipientTarget},
    user::UserId,
};
use herald_infra::{
    directory::{Directory, GroupRegistry, UserFilter},
    dispatch_log::DispatchLog,
    template::TemplateEngine,
};
use herald_shared::{
    event_log::{error as error_fields, event},
    log_business_event,
};
use itertools::Itertools;

/// フェイルクローズ時のエラーエントリ（結果）の定型文
const NO_RECIPIENTS_ERROR: &str = "受信者が 0 件のため、メールは送信されません";

/// 受信者解決器
///
/// ディレクトリ・グループレジストリ・テンプレートエンジンを注入され、
/// 受信者設定の各バリアントを配信ターゲット列へ写像する。
pub struct RecipientResolver {
    directory: Arc<dyn Directory>,
    groups:    Arc<dyn GroupRegistry>,
    engine:    Arc<dyn TemplateEngine>,
}

impl RecipientResolver {
    pub fn new(
        directory: Arc<dyn Directory>,
        groups: Arc<dyn GroupRegistry>,
        engine: Arc<dyn TemplateEngine>,
    ) -> Self {
        Self {
            directory,
            groups,
            engine,
        }
    }

    /// 受信者設定を配信ターゲット列に解決する
    ///
    /// 戻り値の順序は配信順そのもの（ディレクトリの自然順、または
    /// snippet のデコード順）。あらゆる失敗は空のターゲット列 +
    /// 警告/エラーのログ対に縮退し、エラーは伝播しない。
    pub async fn resolve(
        &self,
        spec: &RecipientSpec,
        context: &DispatchContext,
        log: &dyn DispatchLog,
        parent: &LogEntryId,
    ) -> Vec<RecipientTarget> {
        let targets = match spec {
            RecipientSpec::AllUsers => self.find_users(UserFilter::All, log, parent).await,
            RecipientSpec::AllAdmins => self.find_users(UserFilter::AdminsOnly, log, parent).await,
            RecipientSpec::UsersInGroups { groups } => {
                self.resolve_groups(groups.as_ref(), log, parent).await
            }
            RecipientSpec::Custom { kind, snippet } => {
                self.resolve_custom(*kind, snippet.as_deref(), context, log, parent)
                    .await
            }
            // 未知タイプのフェイルクローズは明示アーム（省略ではなく設計）
            RecipientSpec::Unknown { raw } => {
                let reason = match raw {
                    Some(raw) => format!("未知の受信者タイプです: {raw}"),
                    None => "受信者タイプが指定されていません".to_string(),
                };
                fail_closed(log, parent, reason)
            }
        };

        log_business_event!(
            event.category = event::category::DISPATCH,
            event.action = event::action::RECIPIENTS_RESOLVED,
            event.entity_type = event::entity_type::MESSAGE,
            event.result = event::result::SUCCESS,
            recipients.spec = spec.type_name(),
            recipients.count = targets.len(),
            "受信者解決完了"
        );

        targets
    }

    /// グループ選択をユーザー検索に展開する
    async fn resolve_groups(
        &self,
        selection: Option<&GroupSelection>,
        log: &dyn DispatchLog,
        parent: &LogEntryId,
    ) -> Vec<RecipientTarget> {
        let group_ids = match selection {
            Some(GroupSelection::All) => match self.groups.list_group_ids().await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::error!(
                        error.category = error_fields::category::INFRASTRUCTURE,
                        error.kind = error_fields::kind::GROUP_REGISTRY,
                        "グループ一覧の取得に失敗: {}",
                        e
                    );
                    return fail_closed(
                        log,
                        parent,
                        format!("グループ一覧の取得に失敗しました: {e}"),
                    );
                }
            },
            Some(GroupSelection::Ids(ids)) => ids.clone(),
            None => {
                return fail_closed(
                    log,
                    parent,
                    "groupIds が不正または未指定のため、グループを解決できません".to_string(),
                );
            }
        };

        self.find_users(UserFilter::InGroups(group_ids), log, parent)
            .await
    }

    /// snippet を描画し、出力の JSON 配列を受信者リストとして解釈する
    ///
    /// - `Users`: ユーザー ID 列としてデコードし、ディレクトリを検索する
    /// - `Emails`: アドレス列としてデコードし、デコード順のままターゲットに
    ///   する（構文検証は配信ループまで遅延）
    async fn resolve_custom(
        &self,
        kind: CustomKind,
        snippet: Option<&str>,
        context: &DispatchContext,
        log: &dyn DispatchLog,
        parent: &LogEntryId,
    ) -> Vec<RecipientTarget> {
        let Some(snippet) = snippet else {
            return fail_closed(
                log,
                parent,
                "snippet が未指定のため、受信者を解決できません".to_string(),
            );
        };

        let rendered = match self.engine.render(snippet, context) {
            Ok(rendered) => rendered,
            Err(e) => {
                return fail_closed(log, parent, format!("snippet の描画に失敗しました: {e}"));
            }
        };

        let rendered = rendered.trim();
        if rendered.is_empty() {
            return fail_closed(log, parent, "snippet の描画結果が空です".to_string());
        }

        match kind {
            CustomKind::Users => {
                let ids: Vec<UserId> = match serde_json::from_str(rendered) {
                    Ok(ids) => ids,
                    Err(e) => {
                        return fail_closed(
                            log,
                            parent,
                            format!(
                                "snippet の描画結果をユーザー ID の JSON 配列として解釈できません: {e}"
                            ),
                        );
                    }
                };
                // 同一 ID の重複指定は照会前に畳む
                // （ターゲット列の重複排除は配信ループの責務）
                let ids: Vec<UserId> = ids.into_iter().unique().collect();
                self.find_users(UserFilter::ByIds(ids), log, parent).await
            }
            CustomKind::Emails => match serde_json::from_str::<Vec<String>>(rendered) {
                Ok(addresses) => addresses.into_iter().map(RecipientTarget::Email).collect(),
                Err(e) => fail_closed(
                    log,
                    parent,
                    format!(
                        "snippet の描画結果をメールアドレスの JSON 配列として解釈できません: {e}"
                    ),
                ),
            },
        }
    }

    /// ディレクトリを検索してターゲット列に変換する（障害はフェイルクローズ）
    async fn find_users(
        &self,
        filter: UserFilter,
        log: &dyn DispatchLog,
        parent: &LogEntryId,
    ) -> Vec<RecipientTarget> {
        match self.directory.find_users(&filter).await {
            Ok(users) => users.into_iter().map(RecipientTarget::User).collect(),
            Err(e) => {
                tracing::error!(
                    error.category = error_fields::category::INFRASTRUCTURE,
                    error.kind = error_fields::kind::DIRECTORY,
                    "ディレクトリ検索に失敗: {}",
                    e
                );
                fail_closed(log, parent, format!("ディレクトリ検索に失敗しました: {e}"))
            }
        }
    }
}

/// フェイルクローズ: 警告（原因）とエラー（結果）の対を記録し、空を返す
fn fail_closed(
    log: &dyn DispatchLog,
    parent: &LogEntryId,
    reason: String,
) -> Vec<RecipientTarget> {
    log.warning(reason, Some(parent));
    log.error(NO_RECIPIENTS_ERROR.to_string(), Some(parent));
    Vec::new()
}
