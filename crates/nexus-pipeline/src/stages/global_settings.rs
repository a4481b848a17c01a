//! グローバル設定ステージ
//!
//! グローバルアプリ設定のディスカバリアドレスをターゲットに合わせて
//! 書き換え、ソリューション名のKVキーへアップロードします。
//! 管理トークンは成果物ファイルには書き込みません。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;

use nexus_consul::AccessControl;

use crate::patch;
use crate::pipeline::Stage;
use crate::state::RunState;

/// グローバル設定内のディスカバリアドレスのパス
const DISCOVERY_ADDR_PATH: &[&str] = &["discovery", "address"];

pub struct GlobalSettingsStage {
    acl: Arc<dyn AccessControl>,
    path: PathBuf,
    discovery_addr: String,
    solution: String,
}

impl GlobalSettingsStage {
    pub fn new(
        acl: Arc<dyn AccessControl>,
        path: PathBuf,
        discovery_addr: impl Into<String>,
        solution: impl Into<String>,
    ) -> Self {
        Self {
            acl,
            path,
            discovery_addr: discovery_addr.into(),
            solution: solution.into(),
        }
    }

    fn rewrite_file(&self) -> anyhow::Result<String> {
        let content = std::fs::read_to_string(&self.path)?;
        let mut value: serde_json::Value = serde_json::from_str(&content)?;
        patch::set_string(&mut value, DISCOVERY_ADDR_PATH, &self.discovery_addr)?;
        let blob = serde_json::to_string_pretty(&value)?;
        std::fs::write(&self.path, format!("{blob}\n"))?;
        Ok(blob)
    }
}

#[async_trait]
impl Stage for GlobalSettingsStage {
    fn name(&self) -> &str {
        "global-settings"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        if !self.path.exists() {
            state.soft_error(format!(
                "グローバル設定がありません: {}",
                self.path.display()
            ));
            return state;
        }

        println!("  グローバル設定を更新中: {}", self.path.display());
        let blob = match self.rewrite_file() {
            Ok(blob) => blob,
            Err(e) => {
                state.fail(format!("グローバル設定の更新に失敗しました: {e:#}"));
                return state;
            }
        };

        if let Err(e) = self
            .acl
            .kv_put(&state.global_token, &self.solution, &blob)
            .await
        {
            state.fail(format!("グローバル設定のKVアップロードに失敗しました: {e}"));
            return state;
        }
        println!("  {} KVキー: {}", "✓".green(), self.solution.cyan());
        state.log("global settings uploaded");
        state
    }
}
