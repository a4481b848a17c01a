//! モデル定義
//!
//! ソリューション設定（nexus.json）のデータモデルと、
//! プロジェクトルート配下の成果物パス規約を定義します。

pub mod layout;
pub mod service;
pub mod solution;

// Re-exports
pub use layout::*;
pub use service::*;
pub use solution::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SolutionConfig {
        let mut config = SolutionConfig::new("acme", "ghcr.io/acme");
        config.services.push(ServiceConfig {
            name: "orders".to_string(),
            project: None,
            port: 7602,
            db_port: Some(7603),
        });
        config.services.push(ServiceConfig {
            name: "billing".to_string(),
            project: Some("src/billing".to_string()),
            port: 7605,
            db_port: None,
        });
        config
    }

    #[test]
    fn framework_defaults() {
        let framework = FrameworkConfig::default();
        assert_eq!(framework.gateway.name, "api-gateway");
        assert_eq!(framework.gateway.port, 7500);
        assert_eq!(framework.dashboard.name, "health-dashboard");
        assert_eq!(framework.frontend.port, 7000);
    }

    #[test]
    fn derived_names() {
        let config = sample_config();
        assert_eq!(config.network_name(), "acme-network");
        assert_eq!(config.discovery_server_name(2), "acme-discovery-2");
        assert_eq!(config.cluster_namespace(), "acme");
    }

    #[test]
    fn explicit_namespace_wins() {
        let mut config = sample_config();
        config.namespace = Some("acme-dev".to_string());
        assert_eq!(config.cluster_namespace(), "acme-dev");
    }

    #[test]
    fn next_port_is_two_above_highest() {
        let config = sample_config();
        // dbポートも含めた最大は 7605 (billing)
        assert_eq!(config.next_service_port(), 7607);

        let empty = SolutionConfig::new("acme", "");
        // フレームワークの最大ポート (dashboard 7600) が基準
        assert_eq!(empty.next_service_port(), 7602);
    }

    #[test]
    fn project_dir_defaults_to_services_subdir() {
        let config = sample_config();
        assert_eq!(config.services[0].project_dir(), "services/orders");
        assert_eq!(config.services[1].project_dir(), "src/billing");
    }

    #[test]
    fn validate_rejects_duplicate_service() {
        let mut config = sample_config();
        config.services.push(ServiceConfig {
            name: "orders".to_string(),
            project: None,
            port: 7700,
            db_port: None,
        });
        assert!(matches!(
            config.validate(),
            Err(crate::error::ConfigError::DuplicateService(name)) if name == "orders"
        ));
    }

    #[test]
    fn validate_rejects_port_conflict() {
        let mut config = sample_config();
        config.services.push(ServiceConfig {
            name: "payments".to_string(),
            project: None,
            port: 7602,
            db_port: None,
        });
        assert!(matches!(
            config.validate(),
            Err(crate::error::ConfigError::PortConflict { port: 7602, .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_service_name() {
        let mut config = sample_config();
        config.services.push(ServiceConfig {
            name: "Orders!".to_string(),
            project: None,
            port: 7700,
            db_port: None,
        });
        assert!(matches!(
            config.validate(),
            Err(crate::error::ConfigError::InvalidServiceName(_))
        ));
    }

    #[test]
    fn config_round_trips_through_camel_case_json() {
        let config = sample_config();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"dockerRepository\""));
        assert!(json.contains("\"dbPort\""));
        let parsed: SolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.solution, "acme");
        assert_eq!(parsed.services[0].db_port, Some(7603));
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let parsed: SolutionConfig =
            serde_json::from_str(r#"{ "solution": "tiny", "framework": {} }"#).unwrap();
        assert_eq!(parsed.discovery.servers, 3);
        assert_eq!(parsed.discovery.http_addr, "http://localhost:8500");
        assert_eq!(parsed.framework.gateway.port, 7500);
        assert!(parsed.services.is_empty());
    }

    #[test]
    fn layout_paths_follow_conventions() {
        let layout = SolutionLayout::new("/work/acme");
        assert_eq!(
            layout.discovery_compose_file(),
            std::path::PathBuf::from("/work/acme/infra/discovery/docker-compose.yml")
        );
        assert_eq!(
            layout.discovery_server_template(1),
            std::path::PathBuf::from("/work/acme/infra/discovery/templates/server1.json")
        );
        assert_eq!(
            layout.discovery_server_config(3),
            std::path::PathBuf::from("/work/acme/infra/discovery/config/server3.json")
        );
        let dir = layout.service_dir("services/orders");
        assert_eq!(
            layout.policy_file(&dir),
            std::path::PathBuf::from("/work/acme/services/orders/consul/policy.hcl")
        );
        assert_eq!(
            layout.dev_cert_bundle(),
            std::path::PathBuf::from("/work/acme/certs/dev-cert.p12")
        );
    }
}
