//! イメージビルドと公開
//!
//! デプロイ単位の解決、タイムスタンプ版タグの発行、docker build / push の
//! 実行をまとめます。

pub mod builder;
pub mod error;
pub mod plan;
pub mod progress;
pub mod pusher;
pub mod version;

// Re-exports
pub use builder::ImageBuilder;
pub use error::{BuildError, Result};
pub use plan::{ImageSpec, image_plan};
pub use pusher::ImagePusher;
pub use version::{current_version_tag, version_tag};
