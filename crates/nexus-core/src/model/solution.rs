//! ソリューション定義

use super::service::{ServiceConfig, is_valid_name};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// ソリューション設定 (`nexus.json`)
///
/// ソリューション名、イメージリポジトリ、ディスカバリ設定、
/// フレームワークサービスとユーザーサービスの一覧を保持します。
/// パイプラインの実行中にこのファイルが書き換わることはありません。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionConfig {
    /// ソリューション名
    pub solution: String,
    /// イメージのプッシュ先リポジトリ (例: ghcr.io/acme)
    #[serde(default)]
    pub docker_repository: String,
    /// Kubernetesネームスペース（省略時はソリューション名）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// サービスディスカバリ設定
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// フレームワークサービス（ゲートウェイ・ダッシュボード・フロントエンド）
    #[serde(default)]
    pub framework: FrameworkConfig,
    /// ユーザー定義サービス
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

impl SolutionConfig {
    pub fn new(solution: impl Into<String>, docker_repository: impl Into<String>) -> Self {
        Self {
            solution: solution.into(),
            docker_repository: docker_repository.into(),
            namespace: None,
            discovery: DiscoveryConfig::default(),
            framework: FrameworkConfig::default(),
            services: Vec::new(),
        }
    }

    /// ソリューション専用のDockerネットワーク名
    pub fn network_name(&self) -> String {
        format!("{}-network", self.solution)
    }

    /// ディスカバリサーバーのコンテナ名（1始まり）
    pub fn discovery_server_name(&self, index: u32) -> String {
        format!("{}-discovery-{}", self.solution, index)
    }

    /// クラスタターゲットで使用するネームスペース
    pub fn cluster_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.solution)
    }

    pub fn find_service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    /// フレームワークも含めて名前が使用済みか
    pub fn has_service(&self, name: &str) -> bool {
        self.framework.gateway.name == name
            || self.framework.dashboard.name == name
            || self.framework.frontend.name == name
            || self.find_service(name).is_some()
    }

    /// 次に割り当てるポート番号（使用中の最大ポート + 2）
    ///
    /// +2 なのはサービスとデータベースのポートを隣接して割り当てるためです。
    pub fn next_service_port(&self) -> u16 {
        let mut highest = self
            .framework
            .gateway
            .port
            .max(self.framework.dashboard.port)
            .max(self.framework.frontend.port);
        for service in &self.services {
            highest = highest.max(service.port);
            if let Some(db_port) = service.db_port {
                highest = highest.max(db_port);
            }
        }
        highest + 2
    }

    /// 設定全体の検証
    ///
    /// 名前の形式、名前の重複、ポートの衝突をチェックします。
    pub fn validate(&self) -> Result<()> {
        if !is_valid_name(&self.solution) {
            return Err(ConfigError::InvalidSolutionName(self.solution.clone()));
        }
        if self.discovery.servers == 0 {
            return Err(ConfigError::InvalidConfig(
                "discovery.servers は 1 以上を指定してください".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut ports: HashMap<u16, String> = HashMap::new();
        let framework = [
            (
                self.framework.gateway.name.as_str(),
                self.framework.gateway.port,
            ),
            (
                self.framework.dashboard.name.as_str(),
                self.framework.dashboard.port,
            ),
            (
                self.framework.frontend.name.as_str(),
                self.framework.frontend.port,
            ),
        ];
        for (name, port) in framework {
            if !is_valid_name(name) {
                return Err(ConfigError::InvalidServiceName(name.to_string()));
            }
            if !names.insert(name.to_string()) {
                return Err(ConfigError::DuplicateService(name.to_string()));
            }
            claim_port(&mut ports, port, name)?;
        }
        for service in &self.services {
            if !is_valid_name(&service.name) {
                return Err(ConfigError::InvalidServiceName(service.name.clone()));
            }
            if !names.insert(service.name.clone()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
            claim_port(&mut ports, service.port, &service.name)?;
            if let Some(db_port) = service.db_port {
                claim_port(&mut ports, db_port, &service.name)?;
            }
        }
        Ok(())
    }
}

fn claim_port(ports: &mut HashMap<u16, String>, port: u16, owner: &str) -> Result<()> {
    if let Some(first) = ports.insert(port, owner.to_string()) {
        return Err(ConfigError::PortConflict {
            port,
            first,
            second: owner.to_string(),
        });
    }
    Ok(())
}

/// サービスディスカバリ（Consulクラスタ）の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// サーバーノード数
    #[serde(default = "default_servers")]
    pub servers: u32,
    /// 操作側から到達できるHTTPアドレス
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    /// クラスタターゲットで使用するHTTPアドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_http_addr: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            http_addr: default_http_addr(),
            cluster_http_addr: None,
        }
    }
}

fn default_servers() -> u32 {
    3
}

fn default_http_addr() -> String {
    "http://localhost:8500".to_string()
}

/// フレームワークサービス定義
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkConfig {
    #[serde(default = "default_gateway")]
    pub gateway: FrameworkService,
    #[serde(default = "default_dashboard")]
    pub dashboard: FrameworkService,
    #[serde(default = "default_frontend")]
    pub frontend: FrameworkService,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            gateway: default_gateway(),
            dashboard: default_dashboard(),
            frontend: default_frontend(),
        }
    }
}

/// フレームワークサービス1つ分（名前と公開ポート）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkService {
    pub name: String,
    pub port: u16,
}

fn default_gateway() -> FrameworkService {
    FrameworkService {
        name: "api-gateway".to_string(),
        port: 7500,
    }
}

fn default_dashboard() -> FrameworkService {
    FrameworkService {
        name: "health-dashboard".to_string(),
        port: 7600,
    }
}

fn default_frontend() -> FrameworkService {
    FrameworkService {
        name: "frontend".to_string(),
        port: 7000,
    }
}
