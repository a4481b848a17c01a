//! Nexus コア機能
//!
//! ソリューション設定（nexus.json）の読み書き、プロジェクトルート探索、
//! 成果物パスの規約、雛形生成を提供します。

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;
pub mod scaffold;
pub mod template;

// Re-exports
pub use discovery::{CONFIG_FILE, PROJECT_ROOT_ENV, find_project_root, find_project_root_from};
pub use error::{ConfigError, Result};
pub use loader::{load_solution, save_solution};
pub use model::layout::SolutionLayout;
pub use model::service::{ServiceConfig, is_valid_name};
pub use model::solution::{DiscoveryConfig, FrameworkConfig, FrameworkService, SolutionConfig};
pub use scaffold::{ScaffoldReport, scaffold_service, scaffold_solution};
