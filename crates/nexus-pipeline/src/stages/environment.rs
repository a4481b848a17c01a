//! 環境ファイル生成ステージ
//!
//! Compose起動に先立って .env と docker-compose.override.yml を毎回
//! 生成し直します。.env はポートとネットワークの変数、オーバーライドは
//! サービスごとのディスカバリ接続情報（アドレスとトークン）です。

use std::collections::BTreeMap;

use async_trait::async_trait;
use colored::Colorize;
use serde::Serialize;

use nexus_core::{SolutionConfig, SolutionLayout};

use crate::pipeline::Stage;
use crate::state::RunState;

pub struct EnvironmentStage {
    config: SolutionConfig,
    layout: SolutionLayout,
    discovery_addr: String,
}

#[derive(Serialize)]
struct OverrideFile {
    services: BTreeMap<String, OverrideService>,
}

#[derive(Serialize)]
struct OverrideService {
    environment: BTreeMap<String, String>,
}

impl EnvironmentStage {
    pub fn new(
        config: SolutionConfig,
        layout: SolutionLayout,
        discovery_addr: impl Into<String>,
    ) -> Self {
        Self {
            config,
            layout,
            discovery_addr: discovery_addr.into(),
        }
    }

    /// .env のエントリ（並びは決定的）
    fn env_entries(&self, state: &RunState) -> Vec<(String, String)> {
        let image_version = if state.image_version.is_empty() {
            "latest".to_string()
        } else {
            state.image_version.clone()
        };
        let mut entries = vec![
            ("SOLUTION".to_string(), self.config.solution.clone()),
            ("NETWORK_NAME".to_string(), self.config.network_name()),
            ("SUBNET".to_string(), state.subnet.clone()),
            ("DISCOVERY_HTTP_ADDR".to_string(), self.discovery_addr.clone()),
            ("IMAGE_VERSION".to_string(), image_version),
            (
                "FRONTEND_PORT".to_string(),
                self.config.framework.frontend.port.to_string(),
            ),
            (
                "GATEWAY_PORT".to_string(),
                self.config.framework.gateway.port.to_string(),
            ),
            (
                "DASHBOARD_PORT".to_string(),
                self.config.framework.dashboard.port.to_string(),
            ),
        ];
        for service in &self.config.services {
            entries.push((
                format!("{}_PORT", env_key(&service.name)),
                service.port.to_string(),
            ));
            if let Some(db_port) = service.db_port {
                entries.push((
                    format!("{}_DB_PORT", env_key(&service.name)),
                    db_port.to_string(),
                ));
            }
        }
        entries
    }

    fn override_file(&self, state: &RunState) -> OverrideFile {
        let mut services = BTreeMap::new();
        for (name, token) in &state.service_tokens {
            let mut environment = BTreeMap::new();
            environment.insert("CONSUL_HTTP_ADDR".to_string(), self.discovery_addr.clone());
            environment.insert("CONSUL_HTTP_TOKEN".to_string(), token.clone());
            services.insert(name.clone(), OverrideService { environment });
        }
        OverrideFile { services }
    }
}

/// サービス名を環境変数キーへ（orders-api → ORDERS_API）
fn env_key(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

#[async_trait]
impl Stage for EnvironmentStage {
    fn name(&self) -> &str {
        "environment"
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        let env_path = self.layout.env_file();
        let lines: String = self
            .env_entries(&state)
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        if let Err(e) = std::fs::write(&env_path, lines) {
            state.fail(format!("{} を書けません: {e}", env_path.display()));
            return state;
        }
        println!("  {} を生成しました", ".env".cyan());

        let override_path = self.layout.compose_override_file();
        let rendered = match serde_yaml::to_string(&self.override_file(&state)) {
            Ok(rendered) => rendered,
            Err(e) => {
                state.fail(format!("オーバーライドの生成に失敗しました: {e}"));
                return state;
            }
        };
        if let Err(e) = std::fs::write(&override_path, rendered) {
            state.fail(format!("{} を書けません: {e}", override_path.display()));
            return state;
        }
        println!("  {} を生成しました", "docker-compose.override.yml".cyan());
        state.log("environment files generated");
        state
    }
}
