//! 環境の停止・削除ステージ
//!
//! 削除はベストエフォートで進めます。止められなかったものは
//! ソフトエラーとして記録し、残りの削除は続行します。

use std::path::PathBuf;

use async_trait::async_trait;
use colored::Colorize;

use nexus_container::DockerCli;
use nexus_core::SolutionLayout;

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct ComposeDownStage {
    docker: DockerCli,
    file: PathBuf,
    dir: PathBuf,
    display_name: String,
}

impl ComposeDownStage {
    /// ソリューションのComposeを停止する
    pub fn solution(docker: DockerCli, layout: &SolutionLayout) -> Self {
        Self {
            docker,
            file: layout.compose_file(),
            dir: layout.root().to_path_buf(),
            display_name: "compose-down (solution)".to_string(),
        }
    }

    /// ディスカバリのComposeを停止する
    pub fn discovery(docker: DockerCli, layout: &SolutionLayout) -> Self {
        Self {
            docker,
            file: layout.discovery_compose_file(),
            dir: layout.discovery_dir(),
            display_name: "compose-down (discovery)".to_string(),
        }
    }
}

#[async_trait]
impl Stage for ComposeDownStage {
    fn name(&self) -> &str {
        &self.display_name
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        if !self.file.exists() {
            println!("  ℹ Composeファイルが無いためスキップ: {}", self.file.display());
            state.log(format!("skip compose down: {}", self.file.display()));
            return state;
        }
        match self.docker.compose_down(&[self.file.as_path()], &self.dir).await {
            Ok(()) => {
                println!("  {} 停止しました", "✓".green());
                state.log(format!("compose down: {}", self.file.display()));
            }
            Err(e) => state.soft_error(format!("Compose停止に失敗しました: {e}")),
        }
        state
    }
}

pub struct NetworkRemoveStage {
    docker: DockerCli,
    network_name: String,
}

impl NetworkRemoveStage {
    pub fn new(docker: DockerCli, network_name: impl Into<String>) -> Self {
        Self {
            docker,
            network_name: network_name.into(),
        }
    }
}

#[async_trait]
impl Stage for NetworkRemoveStage {
    fn name(&self) -> &str {
        "network-remove"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        match self.docker.remove_network(&self.network_name).await {
            Ok(()) => {
                println!("  🌐 ネットワークを削除しました: {}", self.network_name.cyan());
                state.log(format!("network removed: {}", self.network_name));
            }
            Err(e) => state.soft_error(format!("ネットワークの削除に失敗しました: {e}")),
        }
        state
    }
}

/// 実行のたびに生成される成果物を削除する
///
/// 対象は .env、Composeオーバーライド、実体化したサーバー設定、
/// そして `include_certs` 指定時は開発用証明書バンドルです。
pub struct ArtifactsCleanStage {
    layout: SolutionLayout,
    include_certs: bool,
}

impl ArtifactsCleanStage {
    pub fn new(layout: SolutionLayout, include_certs: bool) -> Self {
        Self {
            layout,
            include_certs,
        }
    }

    fn targets(&self) -> Vec<PathBuf> {
        let mut targets = vec![self.layout.env_file(), self.layout.compose_override_file()];
        let pattern = self.layout.discovery_config_dir().join("server*.json");
        if let Ok(paths) = glob::glob(&pattern.to_string_lossy()) {
            targets.extend(paths.flatten());
        }
        if self.include_certs {
            targets.push(self.layout.dev_cert_bundle());
        }
        targets
    }
}

#[async_trait]
impl Stage for ArtifactsCleanStage {
    fn name(&self) -> &str {
        "artifacts-clean"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        for target in self.targets() {
            if !target.exists() {
                continue;
            }
            match std::fs::remove_file(&target) {
                Ok(()) => {
                    println!("  🗑 {}", target.display());
                    state.log(format!("removed {}", target.display()));
                }
                Err(e) => {
                    state.soft_error(format!("削除に失敗しました: {}: {e}", target.display()));
                }
            }
        }
        state
    }
}
