//! # ユーザーディレクトリ
//!
//! 受信者解決のためのユーザー検索とグループ一覧を担当する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `Directory` / `GroupRegistry` trait で
//!   バックエンド（DB、LDAP、外部 API）を抽象化
//! - **読み取り専用**: 配信処理はディレクトリを変更しない
//! - **アクティブユーザーのみ**: どのフィルタでも非アクティブユーザーは
//!   返さない（退職者への誤送信防止）
//! - **インメモリ実装**: 組み込み・テスト用の [`InMemoryDirectory`] /
//!   [`InMemoryGroupRegistry`] を同梱する

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use herald_domain::{
    group::{Group, GroupId},
    user::{User, UserId},
};

use crate::error::DirectoryError;

/// ユーザー検索フィルタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// 全アクティブユーザー
    All,
    /// 管理者フラグを持つアクティブユーザーのみ
    AdminsOnly,
    /// 指定グループのいずれかに所属するアクティブユーザー（和集合）
    InGroups(Vec<GroupId>),
    /// 指定 ID のアクティブユーザー
    ByIds(Vec<UserId>),
}

/// ユーザーディレクトリトレイト
///
/// 受信者解決のためのユーザー検索を定義する。
/// インフラ層で具体的な実装を提供し、解決器から利用する。
#[async_trait]
pub trait Directory: Send + Sync {
    /// フィルタに一致するユーザーを検索する
    ///
    /// # 戻り値
    ///
    /// ディレクトリの自然順（実装の保存順）で返す。
    /// - `InGroups`: 複数グループに所属するユーザーも 1 回だけ返す（和集合）
    /// - `ByIds`: 存在しない ID は無視し、見つかったユーザーのみ返す
    /// - どのフィルタでも非アクティブユーザーは返さない
    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, DirectoryError>;
}

/// グループレジストリトレイト
///
/// 「全グループ」指定の展開に使う。展開は解決のたびに行われ、
/// キャッシュしない（グループの増減を即座に反映する）。
#[async_trait]
pub trait GroupRegistry: Send + Sync {
    /// 登録されている全グループの ID を返す
    async fn list_group_ids(&self) -> Result<Vec<GroupId>, DirectoryError>;
}

/// Mutex がポイズンされていても内容を取り出す
///
/// インメモリ実装のロック保持区間は短く、パニックを跨いでも
/// Vec の内容は壊れない。
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ===== InMemoryDirectory =====

/// インメモリのユーザーディレクトリ
///
/// 登録順 = ディレクトリの自然順。`Clone` は内部状態を共有するため、
/// テストでは構築側と検証側で同じインスタンスを見られる。
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users:       Arc<Mutex<Vec<User>>>,
    memberships: Arc<Mutex<Vec<(GroupId, UserId)>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            users:       Arc::new(Mutex::new(Vec::new())),
            memberships: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// ユーザーを登録する
    pub fn add_user(&self, user: User) {
        lock(&self.users).push(user);
    }

    /// ユーザーをグループに所属させる
    pub fn assign_group(&self, group_id: GroupId, user_id: UserId) {
        lock(&self.memberships).push((group_id, user_id));
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, DirectoryError> {
        let users = lock(&self.users);
        let found = match filter {
            UserFilter::All => users.iter().filter(|u| u.is_active()).cloned().collect(),
            UserFilter::AdminsOnly => users
                .iter()
                .filter(|u| u.is_active() && u.is_admin())
                .cloned()
                .collect(),
            UserFilter::InGroups(group_ids) => {
                let memberships = lock(&self.memberships);
                let member_ids: HashSet<&UserId> = memberships
                    .iter()
                    .filter(|(group_id, _)| group_ids.contains(group_id))
                    .map(|(_, user_id)| user_id)
                    .collect();
                users
                    .iter()
                    .filter(|u| u.is_active() && member_ids.contains(u.id()))
                    .cloned()
                    .collect()
            }
            UserFilter::ByIds(ids) => users
                .iter()
                .filter(|u| u.is_active() && ids.contains(u.id()))
                .cloned()
                .collect(),
        };
        Ok(found)
    }
}

// ===== InMemoryGroupRegistry =====

/// インメモリのグループレジストリ
///
/// `Clone` は内部状態を共有する。解決中のグループ追加・削除が
/// 次の解決に即座に反映されることをテストで検証できる。
#[derive(Clone, Default)]
pub struct InMemoryGroupRegistry {
    groups: Arc<Mutex<Vec<Group>>>,
}

impl InMemoryGroupRegistry {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// グループを登録する
    pub fn add_group(&self, group: Group) {
        lock(&self.groups).push(group);
    }

    /// グループを削除する
    pub fn remove_group(&self, id: &GroupId) {
        lock(&self.groups).retain(|g| g.id() != id);
    }
}

#[async_trait]
impl GroupRegistry for InMemoryGroupRegistry {
    async fn list_group_ids(&self) -> Result<Vec<GroupId>, DirectoryError> {
        Ok(lock(&self.groups).iter().map(|g| g.id().clone()).collect())
    }
}
