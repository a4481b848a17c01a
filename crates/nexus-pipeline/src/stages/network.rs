//! Dockerネットワーク初期化ステージ
//!
//! 環境が載るブリッジネットワークを用意し、IDとサブネットを
//! 実行状態に記録します。サブネットは後続のディスカバリ設定が使います。

use async_trait::async_trait;
use colored::Colorize;

use nexus_container::DockerCli;

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct NetworkStage {
    docker: DockerCli,
    network_name: String,
}

impl NetworkStage {
    pub fn new(docker: DockerCli, network_name: impl Into<String>) -> Self {
        Self {
            docker,
            network_name: network_name.into(),
        }
    }
}

#[async_trait]
impl Stage for NetworkStage {
    fn name(&self) -> &str {
        "network"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        println!("  🌐 ネットワーク: {}", self.network_name.cyan());
        match self.docker.ensure_network(&self.network_name).await {
            Ok(info) => {
                if info.subnet.is_empty() {
                    state.fail(format!(
                        "ネットワーク '{}' のサブネットを取得できません",
                        self.network_name
                    ));
                    return state;
                }
                println!("  {} サブネット: {}", "✓".green(), info.subnet.cyan());
                state.log(format!(
                    "network {} ready ({}, {})",
                    self.network_name, info.id, info.subnet
                ));
                state.network_name = self.network_name.clone();
                state.network_id = info.id;
                state.subnet = info.subnet;
            }
            Err(e) => {
                state.fail(format!("ネットワークの作成に失敗しました: {e}"));
            }
        }
        state
    }
}
