//! パイプライン組み立て
//!
//! コマンドとターゲットの組に対して実行すべきステージ列を決めます。
//! ターゲットごとの分岐はここに集約し、各ステージは分岐を持ちません。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};

use nexus_build::{ImageBuilder, ImagePusher, image_plan};
use nexus_consul::{AccessControl, ConsulAcl};
use nexus_container::DockerCli;
use nexus_core::{SolutionConfig, SolutionLayout};
use nexus_exec::ToolRunner;
use nexus_kube::KubectlCli;

use crate::pipeline::Pipeline;
use crate::platform::{ClusterPlatform, ComposePlatform, ServicePlatform, ServiceSpec};
use crate::retry::RetryPolicy;
use crate::stages::{
    ArtifactsCleanStage, BuildImagesStage, ClusterDiscoveryStage, ComposeDownStage,
    ComposeUpStage, DevCertsStage, DiscoveryStage, EnvironmentStage, GlobalSettingsStage,
    NetworkRemoveStage, NetworkStage, PublishImagesStage, ServiceStage,
};

/// 外部システムの整定待ちに使う既定のポーリング設定
pub const DEFAULT_POLL: RetryPolicy = RetryPolicy::new(10, Duration::from_secs(2));

/// 実行ターゲット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// サービスはホスト上のプロセス、ディスカバリのみコンテナ
    Local,
    /// すべてコンテナで起動
    Docker,
    /// Kubernetesクラスタへデプロイ
    Cluster,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Target::Local => "local",
            Target::Docker => "docker",
            Target::Cluster => "cluster",
        };
        write!(f, "{label}")
    }
}

/// ターゲットから見たディスカバリHTTPアドレス
pub fn discovery_http_addr(config: &SolutionConfig, target: Target) -> anyhow::Result<String> {
    match target {
        Target::Local | Target::Docker => Ok(config.discovery.http_addr.clone()),
        Target::Cluster => config
            .discovery
            .cluster_http_addr
            .clone()
            .context("nexus.json の discovery.clusterHttpAddr が未設定です"),
    }
}

/// プロビジョニング対象の一覧（ゲートウェイ → ダッシュボード → 各サービス）
pub fn service_specs(config: &SolutionConfig, layout: &SolutionLayout) -> Vec<ServiceSpec> {
    let mut specs = vec![
        ServiceSpec::new(
            &config.framework.gateway.name,
            layout.gateway_dir(),
            config.framework.gateway.port,
            None,
        ),
        ServiceSpec::new(
            &config.framework.dashboard.name,
            layout.dashboard_dir(),
            config.framework.dashboard.port,
            None,
        ),
    ];
    for service in &config.services {
        specs.push(ServiceSpec::new(
            &service.name,
            layout.service_dir(&service.project_dir()),
            service.port,
            service.db_port,
        ));
    }
    specs
}

/// `run <target>` のステージ列を組み立てる
pub fn assemble_run(
    target: Target,
    config: &SolutionConfig,
    layout: &SolutionLayout,
    tool: Arc<dyn ToolRunner>,
) -> anyhow::Result<Pipeline> {
    let discovery_addr = discovery_http_addr(config, target)?;
    let acl: Arc<dyn AccessControl> = Arc::new(ConsulAcl::new(discovery_addr.clone())?);
    let mut pipeline = Pipeline::new();

    match target {
        Target::Local | Target::Docker => {
            let docker = DockerCli::new(tool.clone());
            pipeline.push(Box::new(NetworkStage::new(
                docker.clone(),
                config.network_name(),
            )));
            pipeline.push(Box::new(DevCertsStage::new(
                tool.clone(),
                layout.dev_cert_bundle(),
            )));
            pipeline.push(Box::new(DiscoveryStage::new(
                docker.clone(),
                config.clone(),
                layout.clone(),
                DEFAULT_POLL,
            )));
            pipeline.push(Box::new(GlobalSettingsStage::new(
                acl.clone(),
                layout.global_config_file(),
                discovery_addr.clone(),
                config.solution.clone(),
            )));
            let platform: Arc<dyn ServicePlatform> =
                Arc::new(ComposePlatform::new(acl.clone(), target));
            for spec in service_specs(config, layout) {
                pipeline.push(Box::new(ServiceStage::new(
                    spec,
                    platform.clone(),
                    acl.clone(),
                )));
            }
            if target == Target::Docker {
                pipeline.push(Box::new(EnvironmentStage::new(
                    config.clone(),
                    layout.clone(),
                    discovery_addr,
                )));
                pipeline.push(Box::new(ComposeUpStage::new(
                    docker,
                    layout.clone(),
                    config.framework.frontend.name.clone(),
                    config.framework.frontend.port,
                )));
            }
        }
        Target::Cluster => {
            let kube = KubectlCli::new(tool, config.cluster_namespace());
            pipeline.push(Box::new(ClusterDiscoveryStage::new(
                kube.clone(),
                layout.clone(),
                DEFAULT_POLL,
            )));
            pipeline.push(Box::new(GlobalSettingsStage::new(
                acl.clone(),
                layout.global_config_file(),
                discovery_addr,
                config.solution.clone(),
            )));
            let platform: Arc<dyn ServicePlatform> =
                Arc::new(ClusterPlatform::new(kube, DEFAULT_POLL));
            for spec in service_specs(config, layout) {
                pipeline.push(Box::new(ServiceStage::new(
                    spec,
                    platform.clone(),
                    acl.clone(),
                )));
            }
        }
    }
    Ok(pipeline)
}

/// `docker build` のステージ列
pub fn assemble_build(
    config: &SolutionConfig,
    layout: &SolutionLayout,
    tool: Arc<dyn ToolRunner>,
) -> Pipeline {
    let docker = DockerCli::new(tool);
    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(BuildImagesStage::new(
        ImageBuilder::new(docker),
        image_plan(config, layout),
        config.docker_repository.clone(),
    )));
    pipeline
}

/// `docker publish` のステージ列（ビルドしてからプッシュ）
pub fn assemble_publish(
    config: &SolutionConfig,
    layout: &SolutionLayout,
    tool: Arc<dyn ToolRunner>,
) -> Pipeline {
    let docker = DockerCli::new(tool);
    let mut pipeline = Pipeline::new();
    pipeline.push(Box::new(BuildImagesStage::new(
        ImageBuilder::new(docker.clone()),
        image_plan(config, layout),
        config.docker_repository.clone(),
    )));
    pipeline.push(Box::new(PublishImagesStage::new(
        ImagePusher::new(docker),
        image_plan(config, layout),
        config.docker_repository.clone(),
    )));
    pipeline
}

/// `clean <target>` のステージ列
pub fn assemble_clean(
    target: Target,
    config: &SolutionConfig,
    layout: &SolutionLayout,
    tool: Arc<dyn ToolRunner>,
) -> anyhow::Result<Pipeline> {
    let docker = DockerCli::new(tool);
    let mut pipeline = Pipeline::new();
    match target {
        Target::Local => {
            pipeline.push(Box::new(ComposeDownStage::discovery(docker, layout)));
            pipeline.push(Box::new(ArtifactsCleanStage::new(layout.clone(), true)));
        }
        Target::Docker => {
            pipeline.push(Box::new(ComposeDownStage::solution(docker.clone(), layout)));
            pipeline.push(Box::new(ComposeDownStage::discovery(docker.clone(), layout)));
            pipeline.push(Box::new(NetworkRemoveStage::new(
                docker,
                config.network_name(),
            )));
            pipeline.push(Box::new(ArtifactsCleanStage::new(layout.clone(), false)));
        }
        Target::Cluster => bail!("clean は local / docker ターゲットのみ対応しています"),
    }
    Ok(pipeline)
}
