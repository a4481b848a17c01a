use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "dockerコマンドの実行に失敗しました: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • docker compose v2 がインストールされているか確認してください"
    )]
    Exec(#[from] nexus_exec::ExecError),

    #[error("ネットワーク '{network}' の情報を取得できません: {message}")]
    NetworkInspectFailed { network: String, message: String },

    #[error("docker出力のパースに失敗しました: {0}")]
    ParseError(String),

    #[error("Composeファイルが見つかりません: {0}")]
    ComposeFileNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
