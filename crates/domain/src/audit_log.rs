//! # 配信監査ログ
//!
//! 配信の全過程を記録する木構造ログのデータモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`LogEntry`] | ログエントリ | 追記専用。イベント発火ごとに 1 ルート、受信者ごとに子 |
//! | [`LogLevel`] | ログレベル | info / warning / error / success の 4 段階 |
//!
//! ## 設計方針
//!
//! - **warning / error の対**: 失敗は必ず「原因の warning」と
//!   「結果の error（メール未送信）」の 2 エントリで記録する。
//!   原因と結果を別エントリにすることで、監査時に原因だけを絞り込める
//! - **success は専用レベル**: 送信成功は info ではなく success。
//!   成功件数の集計を level だけで行えるようにする
//! - **親子はエントリ ID で参照**: 木構造はネストではなく
//!   `parent: Option<LogEntryId>` の参照で表現する（追記専用を保つ）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

define_uuid_id! {
    /// ログエントリ ID（一意識別子）
    ///
    /// 木構造の親子参照に使う。UUID v7 を使用。
    pub struct LogEntryId;
}

/// ログレベル
///
/// snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// 通常の進行記録（発火・スキップなど）
    Info,
    /// 失敗の原因（何が悪かったか）
    Warning,
    /// 失敗の結果（メールが送信されなかったこと）
    Error,
    /// 送信成功
    Success,
}

/// ログエントリ
///
/// 追記専用の監査レコード。1 回のイベント発火につき 1 つのルート
/// エントリが作られ、受信者ごとの記録はその子としてぶら下がる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// エントリ ID
    pub id:      LogEntryId,
    /// ログレベル
    pub level:   LogLevel,
    /// メッセージ本文
    pub message: String,
    /// 親エントリ ID（ルートエントリは `None`）
    pub parent:  Option<LogEntryId>,
    /// 記録時刻
    pub at:      DateTime<Utc>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        parent: Option<LogEntryId>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            level,
            message: message.into(),
            parent,
            at,
        }
    }

    /// ルートエントリ（親を持たない）かどうか
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
