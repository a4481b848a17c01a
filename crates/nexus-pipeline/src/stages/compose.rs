//! ソリューションCompose起動ステージ
//!
//! ソリューションのComposeファイル（あればオーバーライドも）で
//! フロントエンドとフレームワーク、各サービスのコンテナを起動します。

use async_trait::async_trait;
use colored::Colorize;

use nexus_container::DockerCli;
use nexus_core::SolutionLayout;

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct ComposeUpStage {
    docker: DockerCli,
    layout: SolutionLayout,
    frontend_name: String,
    frontend_port: u16,
}

impl ComposeUpStage {
    pub fn new(
        docker: DockerCli,
        layout: SolutionLayout,
        frontend_name: impl Into<String>,
        frontend_port: u16,
    ) -> Self {
        Self {
            docker,
            layout,
            frontend_name: frontend_name.into(),
            frontend_port,
        }
    }
}

#[async_trait]
impl Stage for ComposeUpStage {
    fn name(&self) -> &str {
        "compose-up"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        let compose = self.layout.compose_file();
        if !compose.exists() {
            state.fail(format!("Composeファイルがありません: {}", compose.display()));
            return state;
        }

        let override_file = self.layout.compose_override_file();
        let mut files = vec![compose.as_path()];
        if override_file.exists() {
            files.push(override_file.as_path());
        }

        println!("  コンテナを起動中...");
        if let Err(e) = self.docker.compose_up(&files, self.layout.root()).await {
            state.fail(format!("Compose起動に失敗しました: {e}"));
            return state;
        }

        let url = format!("http://localhost:{}", self.frontend_port);
        println!("  {} {}", "✓".green(), url.cyan());
        state
            .service_urls
            .insert(self.frontend_name.clone(), url);
        state.log("solution containers started");
        state
    }
}
