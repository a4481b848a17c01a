//! イメージビルド・公開ステージ
//!
//! ビルドは1回の実行に参加する全デプロイ単位へ同じタイムスタンプ版
//! タグを発行します。公開はビルド済みバージョンがあるときだけ実行でき、
//! 参照ごとに1回だけプッシュします。

use async_trait::async_trait;
use colored::Colorize;

use nexus_build::{BuildError, ImageBuilder, ImagePusher, ImageSpec, current_version_tag};

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct BuildImagesStage {
    builder: ImageBuilder,
    plan: Vec<ImageSpec>,
    repository: String,
}

impl BuildImagesStage {
    pub fn new(builder: ImageBuilder, plan: Vec<ImageSpec>, repository: impl Into<String>) -> Self {
        Self {
            builder,
            plan,
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl Stage for BuildImagesStage {
    fn name(&self) -> &str {
        "build-images"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        let version = current_version_tag();
        println!("  バージョン: {}", version.cyan());
        state.image_version = version.clone();

        for spec in &self.plan {
            println!("  🔨 {}", spec.unit.cyan());
            match self.builder.build(spec, &self.repository, &version).await {
                Ok(()) => state.log(format!("built {}", spec.unit)),
                Err(e) => {
                    state.fail(e.user_message());
                    return state;
                }
            }
        }
        state
    }
}

pub struct PublishImagesStage {
    pusher: ImagePusher,
    plan: Vec<ImageSpec>,
    repository: String,
}

impl PublishImagesStage {
    pub fn new(pusher: ImagePusher, plan: Vec<ImageSpec>, repository: impl Into<String>) -> Self {
        Self {
            pusher,
            plan,
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl Stage for PublishImagesStage {
    fn name(&self) -> &str {
        "publish-images"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        if state.image_version.trim().is_empty() {
            state.fail("公開できるビルドがありません。先に docker build を実行してください");
            return state;
        }
        if self.repository.is_empty() {
            state.fail(BuildError::MissingRepository.user_message());
            return state;
        }

        for spec in &self.plan {
            for image in spec.push_refs(&self.repository, &state.image_version) {
                println!("  ⬆ {}", image.cyan());
                if let Err(e) = self.pusher.push(&image).await {
                    state.fail(e.user_message());
                    return state;
                }
                state.log(format!("pushed {image}"));
            }
        }
        state
    }
}
