//! # グループ
//!
//! ディレクトリ上のユーザーグループを表現する。
//! Herald にとってグループは受信者選択の単位であり、所属メンバーの管理は
//! ディレクトリ側の責務（グループレジストリは ID の列挙のみを提供する）。

use crate::DomainError;

define_uuid_id! {
    /// グループ ID（一意識別子）
    ///
    /// 受信者設定 `users-in-groups` の `groupIds` に現れる識別子。
    pub struct GroupId;
}

define_validated_string! {
    /// グループ名（値オブジェクト）
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct GroupName {
        label: "グループ名",
        max_length: 100,
    }
}

/// ユーザーグループ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id:   GroupId,
    name: GroupName,
}

impl Group {
    /// 新しいグループを作成する
    pub fn new(id: GroupId, name: GroupName) -> Self {
        Self { id, name }
    }

    /// 名前の検証と ID 採番をまとめて行うショートハンド
    ///
    /// テストやシード投入で頻出する「名前だけからグループを作る」操作向け。
    pub fn with_name(name: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self::new(GroupId::new(), GroupName::new(name)?))
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn name(&self) -> &GroupName {
        &self.name
    }
}
