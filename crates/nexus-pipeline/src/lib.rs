//! 実行パイプライン
//!
//! 開発環境の構築・ビルド・削除を固定順のステージ列として実行します。
//! 各ステージは実行状態を受け取って返し、ハード失敗で以降が止まります。
//! ステージ列の組み立ては [`assembler`] に集約されています。

pub mod assembler;
pub mod patch;
pub mod pipeline;
pub mod platform;
pub mod retry;
pub mod stages;
pub mod state;

// Re-exports
pub use assembler::{
    DEFAULT_POLL, Target, assemble_build, assemble_clean, assemble_publish, assemble_run,
    discovery_http_addr, service_specs,
};
pub use pipeline::{Pipeline, Stage};
pub use platform::{ClusterPlatform, ComposePlatform, ServicePlatform, ServiceSpec};
pub use retry::{RetryPolicy, retry};
pub use state::{DEV_CERTS_PASSWORD, PolicyOutcome, RunState, StepStatus};
