//! 成果物パス規約
//!
//! プロジェクトルート配下のファイル配置は規約で固定されています。
//! パイプラインの各ステージはここで計算したパスだけを参照します。

use std::path::{Path, PathBuf};

/// プロジェクトルート配下の成果物パス
#[derive(Debug, Clone)]
pub struct SolutionLayout {
    root: PathBuf,
}

impl SolutionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ソリューション設定 (nexus.json)
    pub fn config_file(&self) -> PathBuf {
        self.root.join(crate::discovery::CONFIG_FILE)
    }

    /// ソリューション全体のComposeファイル
    pub fn compose_file(&self) -> PathBuf {
        self.root.join("docker-compose.yml")
    }

    /// 実行のたびに生成されるComposeオーバーライド
    pub fn compose_override_file(&self) -> PathBuf {
        self.root.join("docker-compose.override.yml")
    }

    /// 実行のたびに生成される環境ファイル
    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    /// グローバルアプリ設定
    pub fn global_config_file(&self) -> PathBuf {
        self.root.join("config/app-config.global.json")
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.root.join("certs")
    }

    /// 開発用TLS証明書バンドル
    pub fn dev_cert_bundle(&self) -> PathBuf {
        self.certs_dir().join("dev-cert.p12")
    }

    /// ディスカバリサーバー一式の置き場所
    pub fn discovery_dir(&self) -> PathBuf {
        self.root.join("infra/discovery")
    }

    pub fn discovery_compose_file(&self) -> PathBuf {
        self.discovery_dir().join("docker-compose.yml")
    }

    /// サーバーノード設定のテンプレート置き場
    pub fn discovery_template_dir(&self) -> PathBuf {
        self.discovery_dir().join("templates")
    }

    pub fn discovery_server_template(&self, index: u32) -> PathBuf {
        self.discovery_template_dir().join(format!("server{index}.json"))
    }

    /// テンプレートから生成した実設定の出力先
    pub fn discovery_config_dir(&self) -> PathBuf {
        self.discovery_dir().join("config")
    }

    pub fn discovery_server_config(&self, index: u32) -> PathBuf {
        self.discovery_config_dir().join(format!("server{index}.json"))
    }

    /// 各サーバーへ配布するACLシード
    pub fn discovery_acl_seed(&self) -> PathBuf {
        self.discovery_dir().join("acl.hcl")
    }

    /// クラスタターゲット用ディスカバリマニフェスト
    pub fn cluster_discovery_dir(&self) -> PathBuf {
        self.discovery_dir().join("cluster")
    }

    pub fn gateway_dir(&self) -> PathBuf {
        self.root.join("infra/gateway")
    }

    pub fn dashboard_dir(&self) -> PathBuf {
        self.root.join("infra/dashboard")
    }

    pub fn frontend_dir(&self) -> PathBuf {
        self.root.join("frontend")
    }

    /// サービスのプロジェクトディレクトリ（相対パスを解決）
    pub fn service_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// サービスディレクトリ配下のACLポリシー定義
    pub fn policy_file(&self, dir: &Path) -> PathBuf {
        dir.join("consul/policy.hcl")
    }

    pub fn app_config_file(&self, dir: &Path) -> PathBuf {
        dir.join("app-config.json")
    }

    pub fn app_settings_file(&self, dir: &Path) -> PathBuf {
        dir.join("app-settings.json")
    }

    pub fn cluster_dir(&self, dir: &Path) -> PathBuf {
        dir.join("cluster")
    }

    /// トークン作成ジョブのマニフェスト
    pub fn token_job_manifest(&self, dir: &Path) -> PathBuf {
        self.cluster_dir(dir).join("token-job.yml")
    }

    pub fn deployment_manifest(&self, dir: &Path) -> PathBuf {
        self.cluster_dir(dir).join("deployment.yml")
    }
}
