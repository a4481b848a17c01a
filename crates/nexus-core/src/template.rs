//! テンプレート展開
//!
//! Tera の一回限りレンダリングへの薄いラッパーです。
//! 雛形生成とディスカバリ設定の実体化で共用します。

use crate::error::{ConfigError, Result};
use std::collections::HashMap;

/// テンプレート変数の組を作る
pub fn vars<const N: usize>(
    entries: [(&str, serde_json::Value); N],
) -> HashMap<String, serde_json::Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// 文字列テンプレートを一度だけ展開する（自動エスケープなし）
pub fn render_str(template: &str, vars: &HashMap<String, serde_json::Value>) -> Result<String> {
    let mut context = tera::Context::new();
    for (key, value) in vars {
        context.insert(key.as_str(), value);
    }
    tera::Tera::one_off(template, &context, false)
        .map_err(|e| ConfigError::TemplateRenderError(e.to_string()))
}
