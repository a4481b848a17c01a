//! Target-specific halves of service provisioning.
//!
//! The five-phase protocol in [`crate::stages::service`] is identical on
//! every target; a [`ServicePlatform`] only decides how a phase talks to
//! its environment. Compose targets exchange tokens over the discovery
//! HTTP API, the cluster target delegates to an in-cluster job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use async_trait::async_trait;

use nexus_consul::AccessControl;
use nexus_kube::KubectlCli;

use crate::assembler::Target;
use crate::retry::{RetryPolicy, retry};

/// Internal port of the scaffolded service databases.
const DB_INTERNAL_PORT: u16 = 5432;

const ROLLOUT_TIMEOUT_SECS: u64 = 180;

/// Descriptor for one provisionable unit (framework or service).
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub name: String,
    /// Absolute directory holding the unit's artifacts.
    pub dir: PathBuf,
    pub port: u16,
    pub db_port: Option<u16>,
}

impl ServiceSpec {
    pub fn new(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        port: u16,
        db_port: Option<u16>,
    ) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            port,
            db_port,
        }
    }

    pub fn policy_file(&self) -> PathBuf {
        self.dir.join("consul").join("policy.hcl")
    }

    pub fn app_config_file(&self) -> PathBuf {
        self.dir.join("app-config.json")
    }

    pub fn app_settings_file(&self) -> PathBuf {
        self.dir.join("app-settings.json")
    }

    pub fn token_job_manifest(&self) -> PathBuf {
        self.dir.join("cluster").join("token-job.yml")
    }

    pub fn deployment_manifest(&self) -> PathBuf {
        self.dir.join("cluster").join("deployment.yml")
    }
}

#[async_trait]
pub trait ServicePlatform: Send + Sync {
    /// Whether a missing policy artifact aborts provisioning instead of
    /// being tolerated as "no policy".
    fn requires_policy_artifact(&self) -> bool;

    /// Exchange the management token and a policy name for a scoped
    /// service token.
    async fn create_token(
        &self,
        global_token: &str,
        spec: &ServiceSpec,
        policy_name: &str,
    ) -> anyhow::Result<String>;

    /// Database endpoint as the service sees it on this target.
    fn database_endpoint(&self, spec: &ServiceSpec) -> Option<(String, u16)>;

    /// Activate the unit and return the URL it is reachable at.
    async fn run_service(&self, spec: &ServiceSpec) -> anyhow::Result<String>;
}

/// Compose-based targets: host processes or solution containers.
pub struct ComposePlatform {
    acl: Arc<dyn AccessControl>,
    target: Target,
}

impl ComposePlatform {
    pub fn new(acl: Arc<dyn AccessControl>, target: Target) -> Self {
        Self { acl, target }
    }
}

#[async_trait]
impl ServicePlatform for ComposePlatform {
    fn requires_policy_artifact(&self) -> bool {
        false
    }

    async fn create_token(
        &self,
        global_token: &str,
        spec: &ServiceSpec,
        policy_name: &str,
    ) -> anyhow::Result<String> {
        let token = self
            .acl
            .create_token(global_token, &spec.name, policy_name)
            .await?;
        Ok(token)
    }

    fn database_endpoint(&self, spec: &ServiceSpec) -> Option<(String, u16)> {
        let db_port = spec.db_port?;
        Some(match self.target {
            // ホスト上のプロセスは公開ポート越しに接続する
            Target::Local => ("localhost".to_string(), db_port),
            _ => (format!("{}-db", spec.name), DB_INTERNAL_PORT),
        })
    }

    async fn run_service(&self, spec: &ServiceSpec) -> anyhow::Result<String> {
        // 起動自体はComposeステージが受け持つ。ここでは到達URLを確定する。
        Ok(match self.target {
            Target::Local => format!("https://localhost:{}", spec.port),
            _ => format!("http://localhost:{}", spec.port),
        })
    }
}

/// Kubernetes cluster target.
pub struct ClusterPlatform {
    kube: KubectlCli,
    poll: RetryPolicy,
}

impl ClusterPlatform {
    pub fn new(kube: KubectlCli, poll: RetryPolicy) -> Self {
        Self { kube, poll }
    }

    async fn apply_manifest(&self, manifest: &Path, what: &str) -> anyhow::Result<()> {
        if !manifest.exists() {
            bail!("{what}がありません: {}", manifest.display());
        }
        self.kube.apply(manifest).await?;
        Ok(())
    }
}

#[async_trait]
impl ServicePlatform for ClusterPlatform {
    fn requires_policy_artifact(&self) -> bool {
        true
    }

    async fn create_token(
        &self,
        _global_token: &str,
        spec: &ServiceSpec,
        _policy_name: &str,
    ) -> anyhow::Result<String> {
        self.apply_manifest(&spec.token_job_manifest(), "トークンジョブのマニフェスト")
            .await?;

        let job = format!("{}-token", spec.name);
        let completed = retry(self.poll, |_| {
            let kube = self.kube.clone();
            let job = job.clone();
            async move {
                match kube.job_succeeded(&job).await {
                    Ok(true) => Some(()),
                    _ => None,
                }
            }
        })
        .await;
        if completed.is_none() {
            bail!("トークンジョブ '{job}' が時間内に完了しませんでした");
        }

        let secret = format!("{}-token", spec.name);
        let token = self
            .kube
            .read_secret(&secret, "token")
            .await?
            .with_context(|| format!("シークレット '{secret}' にトークンがありません"))?;
        Ok(token)
    }

    fn database_endpoint(&self, spec: &ServiceSpec) -> Option<(String, u16)> {
        spec.db_port?;
        Some((format!("{}-db", spec.name), DB_INTERNAL_PORT))
    }

    async fn run_service(&self, spec: &ServiceSpec) -> anyhow::Result<String> {
        self.apply_manifest(&spec.deployment_manifest(), "デプロイメントマニフェスト")
            .await?;
        self.kube
            .rollout_status(&spec.name, ROLLOUT_TIMEOUT_SECS)
            .await?;
        Ok(format!(
            "http://{}.{}.svc:{}",
            spec.name,
            self.kube.namespace(),
            spec.port
        ))
    }
}
