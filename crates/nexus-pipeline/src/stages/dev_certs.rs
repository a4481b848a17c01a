//! 開発用TLS証明書ステージ
//!
//! mkcert で localhost 向けの PKCS#12 バンドルを生成します。
//! パスワードは mkcert 固定の changeit で、RunState の値と一致します。
//! バンドルが既にあれば何もしません。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;

use nexus_exec::{CommandLine, ToolRunner};

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct DevCertsStage {
    tool: Arc<dyn ToolRunner>,
    bundle: PathBuf,
}

impl DevCertsStage {
    pub fn new(tool: Arc<dyn ToolRunner>, bundle: PathBuf) -> Self {
        Self { tool, bundle }
    }
}

#[async_trait]
impl Stage for DevCertsStage {
    fn name(&self) -> &str {
        "dev-certs"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        if self.bundle.exists() {
            println!("  ℹ 証明書は既に存在します: {}", self.bundle.display());
            state.log("dev certs already present");
            return state;
        }

        if let Some(parent) = self.bundle.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                state.soft_error(format!("証明書ディレクトリを作成できません: {e}"));
                return state;
            }
        }

        let command = CommandLine::new("mkcert")
            .args(["-pkcs12", "-p12-file"])
            .arg(self.bundle.display().to_string())
            .args(["localhost", "127.0.0.1", "::1"]);
        match self.tool.run(&command).await {
            Ok(_) => {
                println!("  {} 証明書を作成しました: {}", "✓".green(), self.bundle.display());
                println!("    パスワード: {}", state.dev_certs_password.cyan());
                state.log(format!("dev certs created at {}", self.bundle.display()));
            }
            Err(e) => {
                println!("  {} 証明書の作成に失敗しました（続行します）", "⚠".yellow());
                state.soft_error(format!("証明書の作成に失敗しました: {e}"));
            }
        }
        state
    }
}
