//! パイプラインを構成する各ステージ

pub mod clean;
pub mod compose;
pub mod dev_certs;
pub mod discovery;
pub mod discovery_cluster;
pub mod environment;
pub mod global_settings;
pub mod images;
pub mod network;
pub mod service;

pub use clean::{ArtifactsCleanStage, ComposeDownStage, NetworkRemoveStage};
pub use compose::ComposeUpStage;
pub use dev_certs::DevCertsStage;
pub use discovery::DiscoveryStage;
pub use discovery_cluster::ClusterDiscoveryStage;
pub use environment::EnvironmentStage;
pub use global_settings::GlobalSettingsStage;
pub use images::{BuildImagesStage, PublishImagesStage};
pub use network::NetworkStage;
pub use service::ServiceStage;
