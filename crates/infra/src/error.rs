//! # インフラ層エラー定義
//!
//! ディレクトリやグループレジストリとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **ログ可能性**: Debug によりログ出力時に詳細情報を表示
//! - **SpanTrace 自動捕捉**: convenience constructor でエラー生成時の
//!   呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`DirectoryError`]: エラー種別（[`DirectoryErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`DirectoryErrorKind`]: エラーの具体的な種別（Backend, Unexpected）
//!
//! バックエンド SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
//! 呼び出し側で String にマップして [`DirectoryError::backend`] に渡す。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// ディレクトリ層で発生するエラー
///
/// エラー種別（[`DirectoryErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
/// convenience constructor でエラーを生成すると、その時点のスパン情報が
/// 自動的にキャプチャされる。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](DirectoryError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     DirectoryErrorKind::Backend(msg) => { /* バックエンド障害 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct DirectoryError {
    kind:       DirectoryErrorKind,
    span_trace: SpanTrace,
}

/// ディレクトリ層エラーの種別
///
/// ユーザー検索やグループ一覧の取得などで発生するエラーの具体的な種別。
/// 解決器はこのエラーを伝播せず、警告/エラーのログ対に変換して
/// 受信者 0 件に縮退させる。
#[derive(Debug, Error)]
pub enum DirectoryErrorKind {
    /// バックエンドエラー
    ///
    /// ディレクトリバックエンド（DB、LDAP、外部 API など）への
    /// 問い合わせ失敗。
    #[error("ディレクトリバックエンドエラー: {0}")]
    Backend(String),

    /// 予期しないエラー
    ///
    /// 上記に分類できない予期しないエラー。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== DirectoryError のメソッド =====

impl DirectoryError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &DirectoryErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    // ===== Convenience constructors =====

    /// バックエンドエラーを生成する
    pub fn backend(msg: impl Into<String>) -> Self {
        Self {
            kind:       DirectoryErrorKind::Backend(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       DirectoryErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}
