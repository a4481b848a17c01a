//! プロジェクトルート探索
//!
//! nexus.json を含むディレクトリをプロジェクトルートとして扱います。

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// ソリューション設定のファイル名
pub const CONFIG_FILE: &str = "nexus.json";

/// プロジェクトルートを明示指定する環境変数
pub const PROJECT_ROOT_ENV: &str = "NEXUS_PROJECT_ROOT";

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 NEXUS_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって nexus.json を探す
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    // 1. 環境変数
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking NEXUS_PROJECT_ROOT");
        if path.join(CONFIG_FILE).exists() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "NEXUS_PROJECT_ROOT does not contain nexus.json, ignoring");
    }

    // 2. カレントディレクトリから上に向かって探す
    let start_dir = std::env::current_dir()?;
    find_project_root_from(&start_dir)
}

/// 指定ディレクトリから上に向かって nexus.json を探す
pub fn find_project_root_from(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        debug!(checking = %current.display(), "Looking for nexus.json");
        if current.join(CONFIG_FILE).exists() {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }
        if !current.pop() {
            break;
        }
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(ConfigError::ProjectRootNotFound(start_dir.to_path_buf()))
}
