//! ディスカバリサーバー起動とACLブートストラップ
//!
//! サーバーノード設定をサブネット入りで実体化し、Composeで起動、
//! ACLシードを配布して各サーバーを再起動した後、1台目で
//! `consul acl bootstrap` を実行して管理トークンを取得します。

use async_trait::async_trait;
use colored::Colorize;
use serde_json::json;

use nexus_consul::{ANONYMOUS_TOKEN_EVIDENCE, parse_bootstrap_secret};
use nexus_container::DockerCli;
use nexus_core::{SolutionConfig, SolutionLayout, template};

use crate::pipeline::Stage;
use crate::retry::{RetryPolicy, retry};
use crate::state::RunState;

/// コンテナ内のConsul設定ディレクトリ
const CONSUL_CONFIG_DIR: &str = "/consul/config";

pub struct DiscoveryStage {
    docker: DockerCli,
    config: SolutionConfig,
    layout: SolutionLayout,
    poll: RetryPolicy,
}

impl DiscoveryStage {
    pub fn new(
        docker: DockerCli,
        config: SolutionConfig,
        layout: SolutionLayout,
        poll: RetryPolicy,
    ) -> Self {
        Self {
            docker,
            config,
            layout,
            poll,
        }
    }

    fn server_names(&self) -> Vec<String> {
        (1..=self.config.discovery.servers)
            .map(|index| self.config.discovery_server_name(index))
            .collect()
    }

    /// 起動に必要な成果物の欠落を探す（副作用を起こす前に検査）
    fn missing_artifact(&self) -> Option<std::path::PathBuf> {
        let compose = self.layout.discovery_compose_file();
        if !compose.exists() {
            return Some(compose);
        }
        let seed = self.layout.discovery_acl_seed();
        if !seed.exists() {
            return Some(seed);
        }
        (1..=self.config.discovery.servers)
            .map(|index| self.layout.discovery_server_template(index))
            .find(|template| !template.exists())
    }

    /// サーバーノード設定テンプレートへサブネット由来のbind式を流し込む
    fn materialize_configs(&self, subnet: &str) -> anyhow::Result<()> {
        let bind_addr = bind_addr_expression(subnet);
        std::fs::create_dir_all(self.layout.discovery_config_dir())?;
        for index in 1..=self.config.discovery.servers {
            let source = std::fs::read_to_string(self.layout.discovery_server_template(index))?;
            let rendered =
                template::render_str(&source, &template::vars([("bind_addr", json!(bind_addr))]))?;
            std::fs::write(self.layout.discovery_server_config(index), rendered)?;
        }
        Ok(())
    }
}

/// go-sockaddr のサブネット選択式
///
/// JSON文字列に埋め込むため、引用符はエスケープ済みで返します。
pub(crate) fn bind_addr_expression(subnet: &str) -> String {
    format!(
        r#"{{{{ GetPrivateInterfaces | include \"network\" \"{subnet}\" | attr \"address\" }}}}"#
    )
}

#[async_trait]
impl Stage for DiscoveryStage {
    fn name(&self) -> &str {
        "discovery"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        if let Some(missing) = self.missing_artifact() {
            state.fail(format!(
                "ディスカバリの成果物がありません: {}",
                missing.display()
            ));
            return state;
        }

        println!("  設定を実体化中 (subnet: {})...", state.subnet.cyan());
        if let Err(e) = self.materialize_configs(&state.subnet) {
            state.fail(format!("ディスカバリ設定の実体化に失敗しました: {e:#}"));
            return state;
        }

        println!("  サーバーを起動中...");
        let compose = self.layout.discovery_compose_file();
        if let Err(e) = self
            .docker
            .compose_up(&[compose.as_path()], &self.layout.discovery_dir())
            .await
        {
            state.fail(format!("ディスカバリサーバーの起動に失敗しました: {e}"));
            return state;
        }

        // ACLシードを配布してから各サーバーを再起動
        let seed = self.layout.discovery_acl_seed();
        for server in self.server_names() {
            if let Err(e) = self.docker.copy_into(&seed, &server, CONSUL_CONFIG_DIR).await {
                state.fail(format!("ACLシードを '{server}' へ配布できません: {e}"));
                return state;
            }
            if let Err(e) = self.docker.restart(&server).await {
                state.fail(format!("'{server}' の再起動に失敗しました: {e}"));
                return state;
            }
        }

        // IP割り当てを確認する（確認できなくても続行）
        for server in self.server_names() {
            let ip = retry(self.poll, |_| {
                let docker = self.docker.clone();
                let network = state.network_name.clone();
                let server = server.clone();
                async move { docker.container_ip(&server, &network).await.ok().flatten() }
            })
            .await;
            match ip {
                Some(ip) => {
                    println!("  {} {}: {}", "✓".green(), server, ip);
                    state.log(format!("{server} has address {ip}"));
                }
                None => {
                    state.soft_error(format!(
                        "'{server}' のIPアドレスを確認できませんでした（続行します）"
                    ));
                }
            }
        }

        // シードしたACL設定が反映されたことを示すログ行を待つ
        let evidence = retry(self.poll, |_| {
            let docker = self.docker.clone();
            let servers = self.server_names();
            async move {
                for server in &servers {
                    if let Ok(logs) = docker.logs(server).await {
                        if logs.contains(ANONYMOUS_TOKEN_EVIDENCE) {
                            return Some(server.clone());
                        }
                    }
                }
                None
            }
        })
        .await;
        match evidence {
            Some(server) => state.log(format!("ACL configuration live on {server}")),
            None => state.soft_error(
                "ACL設定反映のログを確認できませんでした（続行します）".to_string(),
            ),
        }

        println!("  ACLをブートストラップ中...");
        let first = self.config.discovery_server_name(1);
        let output = match self
            .docker
            .exec(&first, &["consul", "acl", "bootstrap"])
            .await
        {
            Ok(output) => output,
            Err(e) => {
                state.fail(format!("Unable to Bootstrap ACL: {e}"));
                return state;
            }
        };
        let Some(secret) = parse_bootstrap_secret(&output) else {
            state.fail("Unable to Bootstrap ACL: 出力から SecretID を取得できません");
            return state;
        };
        state.global_token = secret;
        state.log("ACL bootstrapped");
        println!("  {} 管理トークンを取得しました", "✓".green());

        // エージェントトークンを全サーバーへ伝播（ベストエフォート）
        for server in self.server_names() {
            let result = self
                .docker
                .exec(
                    &server,
                    &[
                        "consul",
                        "acl",
                        "set-agent-token",
                        "-token",
                        &state.global_token,
                        "agent",
                        &state.global_token,
                    ],
                )
                .await;
            if let Err(e) = result {
                state.soft_error(format!(
                    "'{server}' へのエージェントトークン設定に失敗しました: {e}"
                ));
            }
        }

        state
    }
}
