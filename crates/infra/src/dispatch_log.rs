//! # 配信ログシンク
//!
//! 配信の全過程を記録する監査ログの書き込み先を抽象化する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `DispatchLog` trait でシンク（インメモリ、
//!   DB、外部サービス）を抽象化
//! - **失敗しない**: ログ記録は配信を止めない。`append` は Result を
//!   返さず、シンク側の障害はシンク実装の責務で吸収する
//! - **tracing へのミラー**: [`InMemoryDispatchLog`] は各エントリを
//!   レベル対応する tracing イベントとしても出力する。監査ログ
//!   （オペレーター向け）と運用ログ（開発者向け）を一度の記録で賄う

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use herald_domain::{
    audit_log::{LogEntry, LogEntryId, LogLevel},
    clock::{Clock, SystemClock},
};

/// 配信ログシンクトレイト
///
/// 木構造の監査ログへの追記を定義する。同期トレイト
/// （書き込みはバッファリングされ、I/O はシンク実装の裏側で行う）。
pub trait DispatchLog: Send + Sync {
    /// エントリを追記し、採番された ID を返す
    fn append(&self, level: LogLevel, message: String, parent: Option<&LogEntryId>) -> LogEntryId;

    /// info エントリを追記する
    fn info(&self, message: String, parent: Option<&LogEntryId>) -> LogEntryId {
        self.append(LogLevel::Info, message, parent)
    }

    /// warning エントリを追記する（失敗の原因）
    fn warning(&self, message: String, parent: Option<&LogEntryId>) -> LogEntryId {
        self.append(LogLevel::Warning, message, parent)
    }

    /// error エントリを追記する（失敗の結果）
    fn error(&self, message: String, parent: Option<&LogEntryId>) -> LogEntryId {
        self.append(LogLevel::Error, message, parent)
    }

    /// success エントリを追記する（送信成功）
    fn success(&self, message: String, parent: Option<&LogEntryId>) -> LogEntryId {
        self.append(LogLevel::Success, message, parent)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// インメモリの配信ログシンク
///
/// エントリを追記順に保持し、tracing にもミラーする。
/// `Clone` は内部状態を共有するため、配信側とテスト検証側で
/// 同じエントリ列を見られる。
#[derive(Clone)]
pub struct InMemoryDispatchLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    clock:   Arc<dyn Clock>,
}

impl Default for InMemoryDispatchLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDispatchLog {
    /// システム時計を使うシンクを作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 時計を注入してシンクを作成（テストで固定時刻を使う場合）
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }

    /// 全エントリを追記順で返す
    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.entries).clone()
    }

    /// 指定エントリの直接の子を追記順で返す
    pub fn children_of(&self, parent: &LogEntryId) -> Vec<LogEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.parent.as_ref() == Some(parent))
            .cloned()
            .collect()
    }
}

impl DispatchLog for InMemoryDispatchLog {
    fn append(&self, level: LogLevel, message: String, parent: Option<&LogEntryId>) -> LogEntryId {
        let entry = LogEntry::new(level, message, parent.cloned(), self.clock.now());
        let id = entry.id.clone();

        match level {
            LogLevel::Info => tracing::info!(
                log.entry_id = %entry.id,
                log.parent = parent.map(tracing::field::display),
                "{}",
                entry.message
            ),
            LogLevel::Warning => tracing::warn!(
                log.entry_id = %entry.id,
                log.parent = parent.map(tracing::field::display),
                "{}",
                entry.message
            ),
            LogLevel::Error => tracing::error!(
                log.entry_id = %entry.id,
                log.parent = parent.map(tracing::field::display),
                "{}",
                entry.message
            ),
            LogLevel::Success => tracing::info!(
                log.entry_id = %entry.id,
                log.parent = parent.map(tracing::field::display),
                log.level = "success",
                "{}",
                entry.message
            ),
        }

        lock(&self.entries).push(entry);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use herald_domain::clock::FixedClock;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_appendはエントリを追記順に保持する() {
        let log = InMemoryDispatchLog::new();

        let root = log.info("発火".to_string(), None);
        log.warning("原因".to_string(), Some(&root));
        log.error("結果".to_string(), Some(&root));

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[2].level, LogLevel::Error);
    }

    #[test]
    fn test_children_ofは直接の子のみを返す() {
        let log = InMemoryDispatchLog::new();

        let root = log.info("発火".to_string(), None);
        let child = log.info("受信者 A".to_string(), Some(&root));
        log.success("送信済み".to_string(), Some(&child));
        log.info("別のルート".to_string(), None);

        let children = log.children_of(&root);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child);

        let grandchildren = log.children_of(&child);
        assert_eq!(grandchildren.len(), 1);
        assert_eq!(grandchildren[0].level, LogLevel::Success);
    }

    #[test]
    fn test_注入した時計の時刻が記録される() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        let log = InMemoryDispatchLog::with_clock(Arc::new(FixedClock::new(at)));

        log.info("発火".to_string(), None);

        assert_eq!(log.entries()[0].at, at);
    }

    #[test]
    fn test_cloneは内部状態を共有する() {
        let log = InMemoryDispatchLog::new();
        let clone = log.clone();

        log.info("共有".to_string(), None);

        assert_eq!(clone.entries().len(), 1);
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryDispatchLog>();
    }
}
