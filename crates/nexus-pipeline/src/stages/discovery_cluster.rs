//! クラスタ版ディスカバリブートストラップ
//!
//! ディスカバリのマニフェスト一式を適用し、ブートストラップジョブが
//! 書き込むシークレットから管理トークンを取り出します。ジョブ側の
//! 手順は雛形のマニフェストに記述されています。

use async_trait::async_trait;
use colored::Colorize;

use nexus_core::SolutionLayout;
use nexus_kube::KubectlCli;

use crate::pipeline::Stage;
use crate::retry::{RetryPolicy, retry};
use crate::state::RunState;

/// ブートストラップジョブが管理トークンを書き込むシークレット名
const BOOTSTRAP_SECRET: &str = "discovery-bootstrap-token";

const READY_TIMEOUT_SECS: u64 = 120;

pub struct ClusterDiscoveryStage {
    kube: KubectlCli,
    layout: SolutionLayout,
    poll: RetryPolicy,
}

impl ClusterDiscoveryStage {
    pub fn new(kube: KubectlCli, layout: SolutionLayout, poll: RetryPolicy) -> Self {
        Self { kube, layout, poll }
    }
}

#[async_trait]
impl Stage for ClusterDiscoveryStage {
    fn name(&self) -> &str {
        "discovery (cluster)"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        let dir = self.layout.cluster_discovery_dir();
        if !dir.exists() {
            state.fail(format!(
                "クラスタ用ディスカバリマニフェストがありません: {}",
                dir.display()
            ));
            return state;
        }

        println!("  マニフェストを適用中...");
        if let Err(e) = self.kube.apply(&dir).await {
            state.fail(format!("ディスカバリマニフェストの適用に失敗しました: {e}"));
            return state;
        }

        if let Err(e) = self.kube.wait_ready("app=discovery", READY_TIMEOUT_SECS).await {
            state.soft_error(format!(
                "ディスカバリPodの準備完了を確認できませんでした（続行します）: {e}"
            ));
        }

        println!("  管理トークンを待機中...");
        let token = retry(self.poll, |_| {
            let kube = self.kube.clone();
            async move {
                match kube.read_secret(BOOTSTRAP_SECRET, "token").await {
                    Ok(Some(token)) if !token.trim().is_empty() => Some(token),
                    _ => None,
                }
            }
        })
        .await;
        match token {
            Some(token) => {
                state.global_token = token;
                state.log("ACL bootstrapped (cluster)");
                println!("  {} 管理トークンを取得しました", "✓".green());
            }
            None => {
                state.fail(format!(
                    "Unable to Bootstrap ACL: シークレット '{BOOTSTRAP_SECRET}' を読めません"
                ));
            }
        }
        state
    }
}
