use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build failed for '{unit}': {message}")]
    BuildFailed { unit: String, message: String },

    #[error("Push failed for '{image}': {message}")]
    PushFailed { image: String, message: String },

    #[error("Docker repository is not configured")]
    MissingRepository,
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     ヒント:\n\
                     • nexus.json の project 設定を確認してください",
                    path.display()
                )
            }
            BuildError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfileが見つかりません: {}\n\
                     \n\
                     ヒント:\n\
                     • デプロイ単位のディレクトリに Dockerfile を配置してください",
                    path.display()
                )
            }
            BuildError::BuildFailed { unit, message } => {
                format!("'{unit}' のビルドに失敗しました: {message}")
            }
            BuildError::PushFailed { image, message } => {
                format!("'{image}' のプッシュに失敗しました: {message}")
            }
            BuildError::MissingRepository => "イメージリポジトリが設定されていません\n\
                 \n\
                 ヒント:\n\
                 • nexus.json の dockerRepository を設定してください"
                .to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
