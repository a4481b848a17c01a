mod common;

use common::{FakeTool, TestSolution, command_failed, stdout};
use nexus_container::DockerCli;
use nexus_pipeline::stages::{
    ArtifactsCleanStage, ComposeDownStage, ComposeUpStage, DevCertsStage, EnvironmentStage,
    NetworkStage,
};
use nexus_pipeline::{RunState, Stage};

const NETWORK_INSPECT: &str = r#"[{
    "Id": "abc123",
    "IPAM": { "Config": [{ "Subnet": "172.28.0.0/16" }] }
}]"#;

#[tokio::test]
async fn network_stage_records_identity_and_subnet() {
    let tool = FakeTool::new(Box::new(|line| {
        if line.starts_with("docker network inspect") {
            stdout(NETWORK_INSPECT)
        } else {
            stdout("")
        }
    }));
    let stage = NetworkStage::new(DockerCli::new(tool), "acme-network");

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert_eq!(state.network_name, "acme-network");
    assert_eq!(state.network_id, "abc123");
    assert_eq!(state.subnet, "172.28.0.0/16");
}

#[tokio::test]
async fn network_without_subnet_is_a_hard_failure() {
    let tool = FakeTool::new(Box::new(|line| {
        if line.starts_with("docker network inspect") {
            stdout(r#"[{ "Id": "abc123", "IPAM": { "Config": [] } }]"#)
        } else {
            stdout("")
        }
    }));
    let stage = NetworkStage::new(DockerCli::new(tool), "acme-network");

    let state = stage.execute(RunState::new()).await;

    assert!(!state.succeeded());
    assert!(state.errors[0].contains("サブネット"));
}

#[tokio::test]
async fn dev_certs_are_not_regenerated() {
    let solution = TestSolution::new();
    let bundle = solution.layout().dev_cert_bundle();
    std::fs::create_dir_all(bundle.parent().unwrap()).unwrap();
    std::fs::write(&bundle, "p12").unwrap();
    let tool = FakeTool::ok();
    let stage = DevCertsStage::new(tool.clone(), bundle);

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn dev_certs_invoke_mkcert_with_fixed_names() {
    let solution = TestSolution::new();
    let bundle = solution.layout().dev_cert_bundle();
    let tool = FakeTool::ok();
    let stage = DevCertsStage::new(tool.clone(), bundle.clone());

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    let calls = tool.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("mkcert -pkcs12 -p12-file"));
    assert!(calls[0].ends_with("localhost 127.0.0.1 ::1"));
    assert!(calls[0].contains(&bundle.display().to_string()));
}

#[tokio::test]
async fn failed_cert_generation_does_not_stop_the_run() {
    let solution = TestSolution::new();
    let tool = FakeTool::new(Box::new(|_| command_failed("mkcert: command not found")));
    let stage = DevCertsStage::new(tool, solution.layout().dev_cert_bundle());

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert_eq!(state.errors.len(), 1);
}

#[tokio::test]
async fn environment_stage_writes_env_and_override() {
    let solution = TestSolution::new();
    let mut config = solution.config();
    config
        .services
        .push(nexus_core::ServiceConfig::new("orders", 7602));
    let stage = EnvironmentStage::new(config, solution.layout(), "http://localhost:8500");

    let mut state = RunState::new();
    state.subnet = "172.28.0.0/16".to_string();
    state
        .service_tokens
        .insert("orders".to_string(), "token-orders".to_string());
    let state = stage.execute(state).await;

    assert!(state.succeeded());
    let env = std::fs::read_to_string(solution.layout().env_file()).unwrap();
    assert!(env.contains("SOLUTION=acme\n"));
    assert!(env.contains("NETWORK_NAME=acme-network\n"));
    assert!(env.contains("SUBNET=172.28.0.0/16\n"));
    // ビルドが先行していなければ latest
    assert!(env.contains("IMAGE_VERSION=latest\n"));
    assert!(env.contains("ORDERS_PORT=7602\n"));

    let rendered =
        std::fs::read_to_string(solution.layout().compose_override_file()).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(
        value["services"]["orders"]["environment"]["CONSUL_HTTP_TOKEN"],
        serde_yaml::Value::String("token-orders".to_string())
    );
}

#[tokio::test]
async fn compose_up_requires_the_solution_compose_file() {
    let solution = TestSolution::new();
    let tool = FakeTool::ok();
    let stage = ComposeUpStage::new(
        DockerCli::new(tool.clone()),
        solution.layout(),
        "frontend",
        7000,
    );

    let state = stage.execute(RunState::new()).await;

    assert!(!state.succeeded());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn compose_up_merges_override_and_records_frontend_url() {
    let solution = TestSolution::new();
    std::fs::write(solution.layout().compose_file(), "services: {}\n").unwrap();
    std::fs::write(solution.layout().compose_override_file(), "services: {}\n").unwrap();
    let tool = FakeTool::ok();
    let stage = ComposeUpStage::new(
        DockerCli::new(tool.clone()),
        solution.layout(),
        "frontend",
        7000,
    );

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert_eq!(state.service_urls["frontend"], "http://localhost:7000");
    let calls = tool.calls();
    assert!(calls[0].contains("docker-compose.yml"));
    assert!(calls[0].contains("docker-compose.override.yml"));
    assert!(calls[0].contains("up -d --remove-orphans"));
}

#[tokio::test]
async fn compose_down_skips_missing_file() {
    let solution = TestSolution::new();
    let tool = FakeTool::ok();
    let stage = ComposeDownStage::discovery(DockerCli::new(tool.clone()), &solution.layout());

    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn artifacts_clean_removes_generated_files() {
    let solution = TestSolution::new();
    let layout = solution.layout();
    std::fs::create_dir_all(layout.discovery_config_dir()).unwrap();
    std::fs::create_dir_all(layout.certs_dir()).unwrap();
    std::fs::write(layout.env_file(), "SOLUTION=acme\n").unwrap();
    std::fs::write(layout.compose_override_file(), "services: {}\n").unwrap();
    std::fs::write(layout.discovery_server_config(1), "{}").unwrap();
    std::fs::write(layout.dev_cert_bundle(), "p12").unwrap();

    let stage = ArtifactsCleanStage::new(layout.clone(), true);
    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert!(!layout.env_file().exists());
    assert!(!layout.compose_override_file().exists());
    assert!(!layout.discovery_server_config(1).exists());
    assert!(!layout.dev_cert_bundle().exists());
}

#[tokio::test]
async fn artifacts_clean_can_preserve_certs() {
    let solution = TestSolution::new();
    let layout = solution.layout();
    std::fs::create_dir_all(layout.certs_dir()).unwrap();
    std::fs::write(layout.env_file(), "SOLUTION=acme\n").unwrap();
    std::fs::write(layout.dev_cert_bundle(), "p12").unwrap();

    let stage = ArtifactsCleanStage::new(layout.clone(), false);
    let state = stage.execute(RunState::new()).await;

    assert!(state.succeeded());
    assert!(!layout.env_file().exists());
    // 証明書はDockerターゲットの削除では残す
    assert!(layout.dev_cert_bundle().exists());
}
