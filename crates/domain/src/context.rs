//! # 配信コンテキスト
//!
//! イベント発火時に一度だけ構築され、テンプレートレンダリングの
//! 入力となるキー・値マッピングを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`DispatchContext`] | 配信コンテキスト | イベントごとに 1 回構築。受信者ごとに拡張コピー |
//!
//! ## 設計方針
//!
//! - **受信者ごとに独立**: `with_recipient` は元のコンテキストを変更せず、
//!   `recipient` キーを追加したコピーを返す。拡張コピーは受信者の処理後に
//!   破棄される
//! - **主オブジェクトの優先順位**: `entry` → `user` → `asset` の順で最初に
//!   見つかった**オブジェクト値**が件名レンダリングのスコープになる。
//!   オブジェクトでない値（文字列など）は主オブジェクトにならない

use serde_json::{Map, Value};

use crate::recipient::RecipientTarget;

/// 主オブジェクトの検出キー（優先順位順）
const PRIMARY_OBJECT_KEYS: [&str; 3] = ["entry", "user", "asset"];

/// 配信コンテキスト
///
/// イベントペイロードから構築されるキー・値マッピング。
/// テンプレートの変数解決に使われる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
    values: Map<String, Value>,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// イベントペイロードの JSON からコンテキストを構築する
    ///
    /// オブジェクトでない値は空のコンテキストに落ちる（寛容パース）。
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(obj) => Self {
                values: obj.clone(),
            },
            None => Self::new(),
        }
    }

    /// キーと値を追加する（既存キーは上書き）
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// キーに対応する値を取得する
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 全キー・値のマッピングを取得する
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// `recipient` キーを追加した拡張コピーを返す
    ///
    /// 元のコンテキストは変更されない。受信者ごとの拡張コピーは
    /// その受信者の処理が終わったら破棄される。
    pub fn with_recipient(&self, target: &RecipientTarget) -> Self {
        let mut extended = self.clone();
        extended.insert("recipient", target.to_context_value());
        extended
    }

    /// 件名レンダリングのスコープになる主オブジェクトを検出する
    ///
    /// `entry` → `user` → `asset` の優先順位で、最初に見つかった
    /// オブジェクト値を `(キー, 値)` で返す。オブジェクト値が
    /// ひとつもなければ `None`（コンテキストスコープのみで描画）。
    pub fn primary_object(&self) -> Option<(&'static str, &Value)> {
        PRIMARY_OBJECT_KEYS.iter().find_map(|key| {
            self.values
                .get(*key)
                .filter(|value| value.is_object())
                .map(|value| (*key, value))
        })
    }
}
