//! 設定ローダー
//!
//! nexus.json の読み込み・保存と読み込み時の検証を行います。

use crate::discovery::CONFIG_FILE;
use crate::error::{ConfigError, Result};
use crate::model::solution::SolutionConfig;
use std::path::Path;
use tracing::info;

/// プロジェクトルートから nexus.json を読み込み検証する
pub fn load_solution(project_root: &Path) -> Result<SolutionConfig> {
    let path = project_root.join(CONFIG_FILE);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound(path));
    }
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let config: SolutionConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
    config.validate()?;
    info!(
        solution = %config.solution,
        services = config.services.len(),
        "Solution config loaded"
    );
    Ok(config)
}

/// nexus.json へ保存する（整形JSON、末尾改行あり）
pub fn save_solution(project_root: &Path, config: &SolutionConfig) -> Result<()> {
    config.validate()?;
    let path = project_root.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    std::fs::write(&path, format!("{json}\n")).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), "Solution config saved");
    Ok(())
}
