mod common;

use common::{FakeTool, TestSolution, command_failed, stdout};
use nexus_build::{ImageBuilder, ImagePusher, image_plan};
use nexus_container::DockerCli;
use nexus_core::ServiceConfig;
use nexus_pipeline::stages::{BuildImagesStage, PublishImagesStage};
use nexus_pipeline::{RunState, Stage};

#[tokio::test]
async fn build_shares_one_version_across_all_units() {
    let solution = TestSolution::new();
    solution.write_build_contexts(&["orders"]);
    let mut config = solution.config();
    config.services.push(ServiceConfig::new("orders", 7602));
    let tool = FakeTool::ok();
    let stage = BuildImagesStage::new(
        ImageBuilder::new(DockerCli::new(tool.clone())),
        image_plan(&config, &solution.layout()),
        config.docker_repository.clone(),
    );

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    // yyyy.MM.dd.HHmmss 形式のバージョンが発行される
    assert!(
        chrono::NaiveDateTime::parse_from_str(&state.image_version, "%Y.%m.%d.%H%M%S").is_ok()
    );

    let calls = tool.calls();
    assert_eq!(calls.len(), 4);
    // 各単位にローカル2参照 + リポジトリ2参照が付く
    let version = &state.image_version;
    assert!(calls[0].contains("-t frontend:latest"));
    assert!(calls[0].contains(&format!("-t frontend:{version}")));
    assert!(calls[0].contains("-t ghcr.io/acme/frontend:latest"));
    assert!(calls[0].contains(&format!("-t ghcr.io/acme/frontend:{version}")));
    // 全単位が同じバージョンを共有する
    for call in &calls {
        assert!(call.contains(version));
    }
}

#[tokio::test]
async fn build_failure_stops_the_fleet() {
    let solution = TestSolution::new();
    solution.write_build_contexts(&["orders"]);
    let mut config = solution.config();
    config.services.push(ServiceConfig::new("orders", 7602));
    let tool = FakeTool::new(Box::new(|line| {
        if line.ends_with("frontend") {
            command_failed("npm install failed")
        } else {
            stdout("")
        }
    }));
    let stage = BuildImagesStage::new(
        ImageBuilder::new(DockerCli::new(tool.clone())),
        image_plan(&config, &solution.layout()),
        config.docker_repository.clone(),
    );

    let state = stage.execute(RunState::new()).await;

    assert!(!state.succeeded());
    assert!(state.errors[0].contains("frontend"));
    // 最初の単位で止まり、残りはビルドされない
    assert_eq!(tool.calls().len(), 1);
}

#[tokio::test]
async fn publish_without_build_leaves_registry_untouched() {
    let solution = TestSolution::new();
    let config = solution.config();
    let tool = FakeTool::ok();
    let stage = PublishImagesStage::new(
        ImagePusher::new(DockerCli::new(tool.clone())),
        image_plan(&config, &solution.layout()),
        config.docker_repository.clone(),
    );

    // image_version が空のまま = ビルドが先行していない
    let state = stage.execute(RunState::new()).await;

    assert!(!state.succeeded());
    assert!(state.errors[0].contains("docker build"));
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn publish_without_repository_is_rejected() {
    let solution = TestSolution::new();
    let mut config = solution.config();
    config.docker_repository = String::new();
    let tool = FakeTool::ok();
    let stage = PublishImagesStage::new(
        ImagePusher::new(DockerCli::new(tool.clone())),
        image_plan(&config, &solution.layout()),
        config.docker_repository.clone(),
    );

    let mut state = RunState::new();
    state.image_version = "2025.08.25.143005".to_string();
    let state = stage.execute(state).await;

    assert!(!state.succeeded());
    assert!(state.errors[0].contains("dockerRepository"));
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn publish_pushes_versioned_then_latest_exactly_once() {
    let solution = TestSolution::new();
    let mut config = solution.config();
    config.services.push(ServiceConfig::new("orders", 7602));
    let tool = FakeTool::ok();
    let stage = PublishImagesStage::new(
        ImagePusher::new(DockerCli::new(tool.clone())),
        image_plan(&config, &solution.layout()),
        config.docker_repository.clone(),
    );

    let mut state = RunState::new();
    state.image_version = "2025.08.25.143005".to_string();
    let state = stage.execute(state).await;

    assert!(state.succeeded());
    let calls = tool.calls();
    // 4単位 × 2参照
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[0], "docker push ghcr.io/acme/frontend:2025.08.25.143005");
    assert_eq!(calls[1], "docker push ghcr.io/acme/frontend:latest");
    assert_eq!(calls[6], "docker push ghcr.io/acme/orders:2025.08.25.143005");
    assert_eq!(calls[7], "docker push ghcr.io/acme/orders:latest");
}
