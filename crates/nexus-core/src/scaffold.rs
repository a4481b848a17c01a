//! 雛形生成
//!
//! `nexus init` と `nexus add service` が作るファイル一式をここで生成します。
//! 生成物は規約パス（[`SolutionLayout`]）に従い、ディスカバリサーバーの
//! 設定テンプレートだけは実行時に展開される `{{ bind_addr }}` を残します。

use crate::error::{ConfigError, Result};
use crate::loader;
use crate::model::layout::SolutionLayout;
use crate::model::service::{ServiceConfig, is_valid_name};
use crate::model::solution::SolutionConfig;
use crate::template;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SERVER_CONFIG_TEMPLATE: &str = include_str!("templates/discovery-server.json.tera");
const DISCOVERY_COMPOSE_TEMPLATE: &str = include_str!("templates/discovery-compose.yml.tera");
const DISCOVERY_ACL_SEED: &str = include_str!("templates/discovery-acl.hcl");
const DISCOVERY_CLUSTER_TEMPLATE: &str = include_str!("templates/discovery-cluster.yml.tera");
const SOLUTION_COMPOSE_TEMPLATE: &str = include_str!("templates/solution-compose.yml.tera");
const POLICY_TEMPLATE: &str = include_str!("templates/policy.hcl.tera");
const APP_CONFIG_TEMPLATE: &str = include_str!("templates/app-config.json.tera");
const APP_SETTINGS_TEMPLATE: &str = include_str!("templates/app-settings.json.tera");
const GLOBAL_CONFIG_TEMPLATE: &str = include_str!("templates/global-config.json.tera");
const TOKEN_JOB_TEMPLATE: &str = include_str!("templates/token-job.yml.tera");
const DEPLOYMENT_TEMPLATE: &str = include_str!("templates/deployment.yml.tera");
const DOCKERFILE_TEMPLATE: &str = include_str!("templates/dockerfile.tera");
const GITIGNORE: &str = include_str!("templates/gitignore");

/// ディスカバリサーバーのコンテナイメージ
const CONSUL_IMAGE: &str = "hashicorp/consul:1.19";

/// 雛形生成の結果
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    /// 新規作成したファイル
    pub created: Vec<PathBuf>,
    /// 追記・更新したファイル
    pub updated: Vec<PathBuf>,
}

/// 新しいソリューション一式を生成する
///
/// `root` 配下に nexus.json、ディスカバリサーバー定義、フレームワーク
/// サービスのディレクトリ、Composeファイルを作成します。
pub fn scaffold_solution(root: &Path, name: &str, repository: &str) -> Result<ScaffoldReport> {
    if !is_valid_name(name) {
        return Err(ConfigError::InvalidSolutionName(name.to_string()));
    }
    let config = SolutionConfig::new(name, repository);
    let layout = SolutionLayout::new(root);
    let mut report = ScaffoldReport::default();

    fs::create_dir_all(root).map_err(|e| ConfigError::IoError {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;
    loader::save_solution(root, &config)?;
    report.created.push(layout.config_file());

    write_file(&mut report, root.join(".gitignore"), GITIGNORE)?;
    scaffold_discovery(&layout, &config, &mut report)?;
    scaffold_global_config(&layout, &config, &mut report)?;
    scaffold_solution_compose(&layout, &config, &mut report)?;
    scaffold_framework(&layout, &config, &mut report)?;

    info!(
        solution = name,
        files = report.created.len(),
        "Solution scaffolded"
    );
    Ok(report)
}

/// 既存ソリューションへサービスの雛形を追加する
///
/// サービスディレクトリの成果物を作成し、ソリューションのComposeファイルへ
/// サービス定義（データベース付きならDBコンテナも）を追記します。
pub fn scaffold_service(
    root: &Path,
    config: &SolutionConfig,
    service: &ServiceConfig,
) -> Result<ScaffoldReport> {
    let layout = SolutionLayout::new(root);
    let dir = layout.service_dir(&service.project_dir());
    let mut report = ScaffoldReport::default();

    scaffold_provisionable(
        &layout,
        config,
        &service.name,
        service.port,
        service.db_port,
        &dir,
        &mut report,
    )?;
    append_compose_service(&layout, config, service, &mut report)?;

    info!(service = %service.name, "Service scaffolded");
    Ok(report)
}

fn scaffold_discovery(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let servers = config.discovery.servers;
    for index in 1..=servers {
        let retry_join = (1..=servers)
            .filter(|i| *i != index)
            .map(|i| format!("\"{}\"", config.discovery_server_name(i)))
            .collect::<Vec<_>>()
            .join(", ");
        let rendered = template::render_str(
            SERVER_CONFIG_TEMPLATE,
            &template::vars([
                ("node_name", json!(config.discovery_server_name(index))),
                ("servers", json!(servers)),
                ("retry_join", json!(retry_join)),
            ]),
        )?;
        write_file(report, layout.discovery_server_template(index), &rendered)?;
    }

    let compose = template::render_str(
        DISCOVERY_COMPOSE_TEMPLATE,
        &template::vars([
            ("solution", json!(config.solution)),
            ("network", json!(config.network_name())),
            ("servers_end", json!(servers + 1)),
            ("consul_image", json!(CONSUL_IMAGE)),
        ]),
    )?;
    write_file(report, layout.discovery_compose_file(), &compose)?;
    write_file(report, layout.discovery_acl_seed(), DISCOVERY_ACL_SEED)?;

    let cluster = template::render_str(
        DISCOVERY_CLUSTER_TEMPLATE,
        &template::vars([
            ("solution", json!(config.solution)),
            ("namespace", json!(config.cluster_namespace())),
            ("servers", json!(servers)),
            ("consul_image", json!(CONSUL_IMAGE)),
        ]),
    )?;
    write_file(
        report,
        layout.cluster_discovery_dir().join("discovery.yml"),
        &cluster,
    )?;
    Ok(())
}

fn scaffold_global_config(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let rendered = template::render_str(
        GLOBAL_CONFIG_TEMPLATE,
        &template::vars([
            ("solution", json!(config.solution)),
            ("http_addr", json!(config.discovery.http_addr)),
        ]),
    )?;
    write_file(report, layout.global_config_file(), &rendered)
}

fn scaffold_solution_compose(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let framework = &config.framework;
    let rendered = template::render_str(
        SOLUTION_COMPOSE_TEMPLATE,
        &template::vars([
            ("solution", json!(config.solution)),
            ("network", json!(config.network_name())),
            ("frontend", json!(framework.frontend.name)),
            ("frontend_port", json!(framework.frontend.port)),
            ("gateway", json!(framework.gateway.name)),
            ("gateway_port", json!(framework.gateway.port)),
            ("dashboard", json!(framework.dashboard.name)),
            ("dashboard_port", json!(framework.dashboard.port)),
        ]),
    )?;
    write_file(report, layout.compose_file(), &rendered)
}

fn scaffold_framework(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let framework = &config.framework;
    scaffold_provisionable(
        layout,
        config,
        &framework.gateway.name,
        framework.gateway.port,
        None,
        &layout.gateway_dir(),
        report,
    )?;
    scaffold_provisionable(
        layout,
        config,
        &framework.dashboard.name,
        framework.dashboard.port,
        None,
        &layout.dashboard_dir(),
        report,
    )?;
    // フロントエンドはACL対象外なのでDockerfileのみ
    let dockerfile = render_dockerfile(&framework.frontend.name, 80)?;
    write_file(report, layout.frontend_dir().join("Dockerfile"), &dockerfile)?;
    Ok(())
}

/// ACLプロビジョニング対象1ユニット分の成果物を生成する
fn scaffold_provisionable(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    name: &str,
    port: u16,
    db_port: Option<u16>,
    dir: &Path,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let http_addr = &config.discovery.http_addr;

    write_file(report, dir.join("Dockerfile"), &render_dockerfile(name, port)?)?;

    let policy = template::render_str(POLICY_TEMPLATE, &template::vars([("name", json!(name))]))?;
    write_file(report, layout.policy_file(dir), &policy)?;

    let app_config = template::render_str(
        APP_CONFIG_TEMPLATE,
        &template::vars([
            ("name", json!(name)),
            ("http_addr", json!(http_addr)),
            ("has_db", json!(db_port.is_some())),
            ("db_port", json!(db_port.unwrap_or(0))),
        ]),
    )?;
    write_file(report, layout.app_config_file(dir), &app_config)?;

    let app_settings = template::render_str(
        APP_SETTINGS_TEMPLATE,
        &template::vars([
            ("name", json!(name)),
            ("port", json!(port)),
            ("http_addr", json!(http_addr)),
        ]),
    )?;
    write_file(report, layout.app_settings_file(dir), &app_settings)?;

    let image = if config.docker_repository.is_empty() {
        format!("{name}:latest")
    } else {
        format!("{}/{}:latest", config.docker_repository, name)
    };
    let token_job = template::render_str(
        TOKEN_JOB_TEMPLATE,
        &template::vars([
            ("name", json!(name)),
            ("namespace", json!(config.cluster_namespace())),
            ("solution", json!(config.solution)),
        ]),
    )?;
    write_file(report, layout.token_job_manifest(dir), &token_job)?;

    let deployment = template::render_str(
        DEPLOYMENT_TEMPLATE,
        &template::vars([
            ("name", json!(name)),
            ("namespace", json!(config.cluster_namespace())),
            ("solution", json!(config.solution)),
            ("port", json!(port)),
            ("image", json!(image)),
        ]),
    )?;
    write_file(report, layout.deployment_manifest(dir), &deployment)?;
    Ok(())
}

fn render_dockerfile(name: &str, port: u16) -> Result<String> {
    template::render_str(
        DOCKERFILE_TEMPLATE,
        &template::vars([("name", json!(name)), ("port", json!(port))]),
    )
}

/// ソリューションのComposeファイルへサービス定義を追記する
fn append_compose_service(
    layout: &SolutionLayout,
    config: &SolutionConfig,
    service: &ServiceConfig,
    report: &mut ScaffoldReport,
) -> Result<()> {
    let path = layout.compose_file();
    if !path.exists() {
        return Err(ConfigError::ComposeFileNotFound(path));
    }
    let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let mut doc: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
    let services = doc
        .get_mut("services")
        .and_then(|v| v.as_mapping_mut())
        .ok_or_else(|| {
            ConfigError::InvalidConfig("docker-compose.yml に services セクションがありません".to_string())
        })?;

    let yml = |s: &str| serde_yaml::Value::String(s.to_string());
    let seq = |items: Vec<String>| {
        serde_yaml::Value::Sequence(items.into_iter().map(serde_yaml::Value::String).collect())
    };

    let mut entry = serde_yaml::Mapping::new();
    entry.insert(yml("build"), yml(&format!("./{}", service.project_dir())));
    entry.insert(yml("image"), yml(&format!("{}:latest", service.name)));
    entry.insert(
        yml("container_name"),
        yml(&format!("{}-{}", config.solution, service.name)),
    );
    entry.insert(
        yml("ports"),
        seq(vec![format!("{}:{}", service.port, service.port)]),
    );
    let mut environment = serde_yaml::Mapping::new();
    environment.insert(yml("PORT"), yml(&service.port.to_string()));
    entry.insert(yml("environment"), serde_yaml::Value::Mapping(environment));
    entry.insert(yml("networks"), seq(vec!["nexus".to_string()]));

    if let Some(db_port) = service.db_port {
        let db_name = format!("{}-db", service.name);
        entry.insert(yml("depends_on"), seq(vec![db_name.clone()]));

        let mut db = serde_yaml::Mapping::new();
        db.insert(yml("image"), yml("postgres:16-alpine"));
        db.insert(
            yml("container_name"),
            yml(&format!("{}-{}", config.solution, db_name)),
        );
        let mut db_env = serde_yaml::Mapping::new();
        db_env.insert(yml("POSTGRES_DB"), yml(&service.name));
        db_env.insert(yml("POSTGRES_USER"), yml(&service.name));
        db_env.insert(yml("POSTGRES_PASSWORD"), yml(&service.name));
        db.insert(yml("environment"), serde_yaml::Value::Mapping(db_env));
        db.insert(yml("ports"), seq(vec![format!("{db_port}:5432")]));
        db.insert(yml("networks"), seq(vec!["nexus".to_string()]));
        services.insert(yml(&db_name), serde_yaml::Value::Mapping(db));
    }

    services.insert(yml(&service.name), serde_yaml::Value::Mapping(entry));

    let updated = serde_yaml::to_string(&doc).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    fs::write(&path, updated).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    report.updated.push(path);
    Ok(())
}

fn write_file(report: &mut ScaffoldReport, path: PathBuf, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    fs::write(&path, content).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    report.created.push(path);
    Ok(())
}
