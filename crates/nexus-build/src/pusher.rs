//! イメージパブリッシャー

use crate::error::{BuildError, Result};
use nexus_container::DockerCli;
use tracing::info;

pub struct ImagePusher {
    docker: DockerCli,
}

impl ImagePusher {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker }
    }

    /// 1参照をリポジトリへプッシュする
    pub async fn push(&self, image: &str) -> Result<()> {
        self.docker
            .push(image)
            .await
            .map_err(|e| BuildError::PushFailed {
                image: image.to_string(),
                message: e.to_string(),
            })?;
        info!(image, "Image pushed");
        Ok(())
    }
}
