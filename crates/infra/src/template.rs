//! # テンプレートエンジン
//!
//! tera をラップし、件名・本文・snippet のレンダリングを担当する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `TemplateEngine` trait でエンジンを注入可能にする。
//!   グローバルなエンジンインスタンスへの直接依存を持たない
//! - **参照の解決**: テンプレート参照が登録済みテンプレート名に一致すれば
//!   それを描画し、一致しなければ参照自体をインラインテンプレートとして
//!   ワンオフ描画する
//! - **オブジェクトスコープ**: 件名レンダリング用に、主オブジェクトの
//!   フィールドを修飾なしで参照できるマージ済みスコープを提供する

use herald_domain::{context::DispatchContext, message::RenderError};
use serde_json::{Map, Value};
use tera::Tera;

/// テンプレートエンジントレイト
///
/// レンダリングの具体的な方法を抽象化する。同期トレイト
/// （テンプレート描画は CPU バウンドで、I/O を伴わない）。
pub trait TemplateEngine: Send + Sync {
    /// テンプレート参照をコンテキストスコープで描画する
    fn render(&self, template: &str, context: &DispatchContext) -> Result<String, RenderError>;

    /// テンプレート参照を主オブジェクトスコープで描画する
    ///
    /// `object` のフィールドを修飾なしで参照できる（例: `{{ title }}`）。
    /// コンテキスト全体のキーも引き続き参照できるが、同名キーは
    /// オブジェクトのフィールドが優先される。
    fn render_object_scoped(
        &self,
        template: &str,
        object: &Value,
        context: &DispatchContext,
    ) -> Result<String, RenderError>;
}

/// tera 実装のテンプレートエンジン
///
/// 名前付きテンプレートの登録と、未登録参照のインラインワンオフ描画を
/// サポートする。
pub struct TeraTemplateEngine {
    engine: Tera,
}

impl Default for TeraTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TeraTemplateEngine {
    /// 空のエンジンインスタンスを作成
    ///
    /// 自動エスケープは登録名の拡張子に関わらず無効にする
    /// （同じ描画出力を HTML とプレーンテキストの両方に使うため）。
    pub fn new() -> Self {
        let mut engine = Tera::default();
        engine.autoescape_on(Vec::new());
        Self { engine }
    }

    /// 名前付きテンプレートを登録する
    ///
    /// 登録済みの同名テンプレートは上書きされる。
    pub fn register_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.engine
            .add_raw_template(name, source)
            .map_err(|e| RenderError::Template(e.to_string()))
    }

    /// 名前付きテンプレートとして登録済みかどうか
    pub fn is_registered(&self, name: &str) -> bool {
        self.engine.get_template_names().any(|n| n == name)
    }

    /// マージ済みの値マップでテンプレート参照を描画する
    fn render_with_map(
        &self,
        template: &str,
        values: Map<String, Value>,
    ) -> Result<String, RenderError> {
        let context = tera::Context::from_value(Value::Object(values))
            .map_err(|e| RenderError::Context(e.to_string()))?;

        if self.is_registered(template) {
            self.engine
                .render(template, &context)
                .map_err(|e| RenderError::Template(e.to_string()))
        } else {
            // 未登録参照はインラインテンプレートとしてワンオフ描画する。
            // 自動エスケープなし（同じ出力を text_body にも使うため）
            Tera::one_off(template, &context, false)
                .map_err(|e| RenderError::Template(e.to_string()))
        }
    }
}

impl TemplateEngine for TeraTemplateEngine {
    fn render(&self, template: &str, context: &DispatchContext) -> Result<String, RenderError> {
        self.render_with_map(template, context.values().clone())
    }

    fn render_object_scoped(
        &self,
        template: &str,
        object: &Value,
        context: &DispatchContext,
    ) -> Result<String, RenderError> {
        let mut values = context.values().clone();
        if let Some(fields) = object.as_object() {
            for (key, value) in fields {
                values.insert(key.clone(), value.clone());
            }
        }
        self.render_with_map(template, values)
    }
}
