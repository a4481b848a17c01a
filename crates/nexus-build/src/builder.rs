//! イメージビルダー
//!
//! デプロイ単位ごとに docker build を実行し、ローカル参照とリポジトリ参照の
//! タグを一括で付与します。

use crate::error::{BuildError, Result};
use crate::plan::ImageSpec;
use crate::progress::BuildProgress;
use nexus_container::DockerCli;
use tracing::info;

pub struct ImageBuilder {
    docker: DockerCli,
}

impl ImageBuilder {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker }
    }

    /// 1デプロイ単位をビルドする
    ///
    /// コンテキストと Dockerfile の存在は実行前に検査します。
    pub async fn build(&self, spec: &ImageSpec, repository: &str, version: &str) -> Result<()> {
        if !spec.context.exists() {
            return Err(BuildError::ContextNotFound(spec.context.clone()));
        }
        let dockerfile = spec.context.join("Dockerfile");
        if !dockerfile.exists() {
            return Err(BuildError::DockerfileNotFound(dockerfile));
        }

        let tags = spec.all_tags(repository, version);
        let progress = BuildProgress::new(&spec.unit);
        match self.docker.build(&spec.context, &tags).await {
            Ok(()) => {
                progress.finish_success();
                info!(unit = %spec.unit, version, "Image built");
                Ok(())
            }
            Err(e) => {
                progress.finish_error(&e.to_string());
                Err(BuildError::BuildFailed {
                    unit: spec.unit.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}
