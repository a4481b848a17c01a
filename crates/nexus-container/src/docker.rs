//! docker CLIラッパー
//!
//! コンテナエンジンの操作はすべて docker CLI 経由で行い、
//! プロセス起動は [`ToolRunner`] ゲートウェイに委譲します。
//! テストではゲートウェイを差し替えて呼び出し列を検証できます。

use crate::error::{ContainerError, Result};
use nexus_exec::{CommandLine, LONG_RUN_TIMEOUT, ToolRunner};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Dockerネットワークの識別情報
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub id: String,
    pub subnet: String,
}

/// docker CLIクライアント
#[derive(Clone)]
pub struct DockerCli {
    runner: Arc<dyn ToolRunner>,
}

impl DockerCli {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = CommandLine::new("docker").args(args.iter().copied());
        let output = self.runner.run(&command).await?;
        Ok(output.stdout)
    }

    /// ネットワークを作成する（既存なら何もしない）
    ///
    /// 作成済みでも成功扱いにした上で、inspect で識別情報を取り直します。
    pub async fn ensure_network(&self, name: &str) -> Result<NetworkInfo> {
        let create = CommandLine::new("docker").args(["network", "create", "--driver", "bridge", name]);
        match self.runner.run(&create).await {
            Ok(_) => {
                info!(network = name, "Network created");
            }
            Err(nexus_exec::ExecError::CommandFailed { stderr, .. })
                if stderr.contains("already exists") =>
            {
                debug!(network = name, "Network already exists");
            }
            Err(e) => return Err(e.into()),
        }
        self.network_info(name).await
    }

    /// `docker network inspect` からIDとサブネットを取り出す
    pub async fn network_info(&self, name: &str) -> Result<NetworkInfo> {
        let stdout = self.run(&["network", "inspect", name]).await?;
        let inspects: Vec<NetworkInspect> =
            serde_json::from_str(&stdout).map_err(|e| ContainerError::ParseError(e.to_string()))?;
        let first = inspects
            .into_iter()
            .next()
            .ok_or_else(|| ContainerError::NetworkInspectFailed {
                network: name.to_string(),
                message: "inspect の出力が空です".to_string(),
            })?;
        let subnet = first
            .ipam
            .config
            .into_iter()
            .find_map(|c| c.subnet)
            .unwrap_or_default();
        Ok(NetworkInfo {
            id: first.id,
            subnet,
        })
    }

    /// ネットワークを削除する（存在しなければ何もしない）
    pub async fn remove_network(&self, name: &str) -> Result<()> {
        let command = CommandLine::new("docker").args(["network", "rm", name]);
        match self.runner.run(&command).await {
            Ok(_) => {
                info!(network = name, "Network removed");
                Ok(())
            }
            Err(nexus_exec::ExecError::CommandFailed { stderr, .. })
                if stderr.contains("not found") || stderr.contains("No such network") =>
            {
                debug!(network = name, "Network already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `docker compose up -d` を実行する
    ///
    /// 複数ファイル指定時は後勝ちでマージされます（オーバーライド用）。
    pub async fn compose_up(&self, files: &[&Path], project_dir: &Path) -> Result<()> {
        let mut command = CommandLine::new("docker").arg("compose");
        for file in files {
            if !file.exists() {
                return Err(ContainerError::ComposeFileNotFound(file.to_path_buf()));
            }
            command = command.arg("-f").arg(file.display().to_string());
        }
        command = command
            .args(["up", "-d", "--remove-orphans"])
            .cwd(project_dir);
        self.runner.run_with_timeout(&command, LONG_RUN_TIMEOUT).await?;
        Ok(())
    }

    /// `docker compose down` を実行する
    pub async fn compose_down(&self, files: &[&Path], project_dir: &Path) -> Result<()> {
        let mut command = CommandLine::new("docker").arg("compose");
        for file in files {
            command = command.arg("-f").arg(file.display().to_string());
        }
        command = command.args(["down", "--remove-orphans"]).cwd(project_dir);
        self.runner.run_with_timeout(&command, LONG_RUN_TIMEOUT).await?;
        Ok(())
    }

    /// ホストのファイルをコンテナへコピーする
    pub async fn copy_into(&self, src: &Path, container: &str, dest: &str) -> Result<()> {
        self.run(&[
            "cp",
            &src.display().to_string(),
            &format!("{container}:{dest}"),
        ])
        .await?;
        Ok(())
    }

    pub async fn restart(&self, container: &str) -> Result<()> {
        self.run(&["restart", container]).await?;
        Ok(())
    }

    /// コンテナ内でコマンドを実行し標準出力を返す
    pub async fn exec(&self, container: &str, command: &[&str]) -> Result<String> {
        let mut args = vec!["exec", container];
        args.extend_from_slice(command);
        self.run(&args).await
    }

    /// コンテナのログを返す（標準出力と標準エラーを連結）
    pub async fn logs(&self, container: &str) -> Result<String> {
        let command = CommandLine::new("docker").args(["logs", container]);
        let output = self.runner.run(&command).await?;
        Ok(format!("{}\n{}", output.stdout, output.stderr))
    }

    /// 指定ネットワーク上でのコンテナIPアドレス
    ///
    /// まだ割り当てられていない場合は `None`。
    pub async fn container_ip(&self, container: &str, network: &str) -> Result<Option<IpAddr>> {
        let stdout = self.run(&["inspect", container]).await?;
        let inspects: Vec<ContainerInspect> =
            serde_json::from_str(&stdout).map_err(|e| ContainerError::ParseError(e.to_string()))?;
        let Some(first) = inspects.into_iter().next() else {
            return Ok(None);
        };
        let ip = first
            .network_settings
            .networks
            .get(network)
            .and_then(|attachment| attachment.ip_address.parse::<IpAddr>().ok());
        Ok(ip)
    }

    /// イメージをビルドする（タグは同時に複数付与）
    pub async fn build(&self, context: &Path, tags: &[String]) -> Result<()> {
        let mut command = CommandLine::new("docker").arg("build");
        for tag in tags {
            command = command.arg("-t").arg(tag);
        }
        command = command.arg(context.display().to_string());
        self.runner.run_with_timeout(&command, LONG_RUN_TIMEOUT).await?;
        Ok(())
    }

    /// イメージをリポジトリへプッシュする
    pub async fn push(&self, image: &str) -> Result<()> {
        let command = CommandLine::new("docker").args(["push", image]);
        self.runner.run_with_timeout(&command, LONG_RUN_TIMEOUT).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct NetworkInspect {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "IPAM", default)]
    ipam: Ipam,
}

#[derive(Debug, Deserialize, Default)]
struct Ipam {
    #[serde(rename = "Config", default)]
    config: Vec<IpamEntry>,
}

#[derive(Debug, Deserialize)]
struct IpamEntry {
    #[serde(rename = "Subnet")]
    subnet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerInspect {
    #[serde(rename = "NetworkSettings", default)]
    network_settings: NetworkSettings,
}

#[derive(Debug, Deserialize, Default)]
struct NetworkSettings {
    #[serde(rename = "Networks", default)]
    networks: HashMap<String, NetworkAttachment>,
}

#[derive(Debug, Deserialize, Default)]
struct NetworkAttachment {
    #[serde(rename = "IPAddress", default)]
    ip_address: String,
}
