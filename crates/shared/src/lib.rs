//! # Herald 共有ユーティリティ
//!
//! このクレートは、Herald
//! プロジェクト全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 配信エンジン（core）と組み込み側プロセスの双方から利用される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（tracing-subscriber は
//!   `observability` フィーチャーでのみ有効になる）

pub mod event_log;
pub mod observability;
