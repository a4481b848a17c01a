use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("設定ファイルが見つかりません: {0}")]
    ConfigNotFound(PathBuf),

    #[error(
        "プロジェクトルートが見つかりません\n探索開始位置: {0}\nヒント: nexus.json ファイルを含むディレクトリで実行してください"
    )]
    ProjectRootNotFound(PathBuf),

    #[error("JSONパースエラー: {path}\n理由: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("無効なソリューション名: '{0}'（小文字英数字とハイフンのみ使用できます）")]
    InvalidSolutionName(String),

    #[error("無効なサービス名: '{0}'（小文字英数字とハイフンのみ使用できます）")]
    InvalidServiceName(String),

    #[error("サービス名が重複しています: {0}")]
    DuplicateService(String),

    #[error("ポート {port} が重複しています: {first} と {second}")]
    PortConflict {
        port: u16,
        first: String,
        second: String,
    },

    #[error("サービスが見つかりません: {0}")]
    ServiceNotFound(String),

    #[error("Composeファイルが見つかりません: {0}\nヒント: 先に `nexus init` でソリューションを作成してください")]
    ComposeFileNotFound(PathBuf),

    #[error("テンプレート展開エラー: {0}")]
    TemplateRenderError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
