use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use nexus_consul::{AccessControl, AclError, CreatedPolicy};
use nexus_core::{SolutionConfig, SolutionLayout};
use nexus_exec::{CommandLine, ExecError, ToolOutput, ToolRunner};
use nexus_pipeline::{RunState, Stage};

/// コマンドラインの内容で応答を切り替えるツールゲートウェイ
pub struct FakeTool {
    calls: Mutex<Vec<String>>,
    responder: Responder,
}

pub type Responder = Box<dyn Fn(&str) -> nexus_exec::Result<ToolOutput> + Send + Sync>;

impl FakeTool {
    pub fn new(responder: Responder) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder,
        })
    }

    /// すべての呼び出しに空出力で成功する
    #[allow(dead_code)]
    pub fn ok() -> Arc<Self> {
        Self::new(Box::new(|_| Ok(ToolOutput::default())))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for FakeTool {
    async fn run(&self, command: &CommandLine) -> nexus_exec::Result<ToolOutput> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(line.clone());
        (self.responder)(&line)
    }

    async fn run_with_timeout(
        &self,
        command: &CommandLine,
        _timeout: Duration,
    ) -> nexus_exec::Result<ToolOutput> {
        self.run(command).await
    }
}

#[allow(dead_code)]
pub fn stdout(s: &str) -> nexus_exec::Result<ToolOutput> {
    Ok(ToolOutput {
        stdout: s.to_string(),
        stderr: String::new(),
    })
}

#[allow(dead_code)]
pub fn command_failed(stderr: &str) -> nexus_exec::Result<ToolOutput> {
    Err(ExecError::CommandFailed {
        program: "docker".to_string(),
        code: Some(1),
        stderr: stderr.to_string(),
    })
}

/// 記録型のアクセス制御実装
#[derive(Default)]
pub struct FakeAcl {
    pub policies: Mutex<Vec<(String, String)>>,
    pub tokens: Mutex<Vec<String>>,
    pub kv: Mutex<HashMap<String, String>>,
    fail_policy: bool,
    empty_token: bool,
}

impl FakeAcl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// ポリシー作成がAPIエラーになる実装
    #[allow(dead_code)]
    pub fn failing_policy() -> Arc<Self> {
        Arc::new(Self {
            fail_policy: true,
            ..Self::default()
        })
    }

    /// 空トークンを返す実装
    #[allow(dead_code)]
    pub fn empty_tokens() -> Arc<Self> {
        Arc::new(Self {
            empty_token: true,
            ..Self::default()
        })
    }
}

#[async_trait]
impl AccessControl for FakeAcl {
    async fn create_policy(
        &self,
        _global_token: &str,
        service: &str,
        rules: &str,
    ) -> nexus_consul::Result<CreatedPolicy> {
        if self.fail_policy {
            return Err(AclError::Api {
                operation: "policy create",
                status: 403,
                body: "Permission denied".to_string(),
            });
        }
        self.policies
            .lock()
            .unwrap()
            .push((service.to_string(), rules.to_string()));
        Ok(CreatedPolicy {
            id: format!("{service}-id"),
            name: format!("{service}-policy"),
        })
    }

    async fn create_token(
        &self,
        _global_token: &str,
        service: &str,
        _policy_name: &str,
    ) -> nexus_consul::Result<String> {
        if self.empty_token {
            return Ok(String::new());
        }
        self.tokens.lock().unwrap().push(service.to_string());
        Ok(format!("token-{service}"))
    }

    async fn kv_put(&self, _global_token: &str, key: &str, blob: &str) -> nexus_consul::Result<()> {
        self.kv
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// 成功または失敗するだけのステージ（実行順の記録付き）
pub struct ScriptStage {
    name: String,
    fail: bool,
    journal: Arc<Mutex<Vec<String>>>,
}

impl ScriptStage {
    #[allow(dead_code)]
    pub fn ok(name: &str, journal: &Arc<Mutex<Vec<String>>>) -> Box<dyn Stage> {
        Box::new(Self {
            name: name.to_string(),
            fail: false,
            journal: journal.clone(),
        })
    }

    #[allow(dead_code)]
    pub fn failing(name: &str, journal: &Arc<Mutex<Vec<String>>>) -> Box<dyn Stage> {
        Box::new(Self {
            name: name.to_string(),
            fail: true,
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl Stage for ScriptStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        self.journal.lock().unwrap().push(self.name.clone());
        if self.fail {
            state.fail(format!("{} exploded", self.name));
        }
        state
    }
}

/// 一時ディレクトリ上のソリューション成果物
pub struct TestSolution {
    pub root: TempDir,
}

#[allow(dead_code)]
impl TestSolution {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn layout(&self) -> SolutionLayout {
        SolutionLayout::new(self.root.path())
    }

    pub fn config(&self) -> SolutionConfig {
        SolutionConfig::new("acme", "ghcr.io/acme")
    }

    /// サービスのプロビジョニング成果物一式を書き込む
    pub fn write_service_artifacts(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join("services").join(name);
        fs::create_dir_all(dir.join("consul")).unwrap();
        fs::write(
            dir.join("consul/policy.hcl"),
            format!("key_prefix \"{name}\" {{\n  policy = \"write\"\n}}\n"),
        )
        .unwrap();
        fs::write(
            dir.join("app-config.json"),
            format!(
                "{{\n  \"serviceName\": \"{name}\",\n  \"discovery\": {{\n    \"address\": \"http://localhost:8500\",\n    \"token\": \"\"\n  }}\n}}\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("app-settings.json"),
            "{\n  \"discovery\": {\n    \"token\": \"\"\n  }\n}\n",
        )
        .unwrap();
        dir
    }

    /// ディスカバリサーバー一式（Compose、ACLシード、ノードテンプレート）
    pub fn write_discovery_artifacts(&self, servers: u32) {
        let discovery = self.root.path().join("infra/discovery");
        fs::create_dir_all(discovery.join("templates")).unwrap();
        fs::write(
            discovery.join("docker-compose.yml"),
            "services:\n  discovery-1:\n    image: hashicorp/consul:1.19\n",
        )
        .unwrap();
        fs::write(
            discovery.join("acl.hcl"),
            "acl {\n  enabled = true\n}\n",
        )
        .unwrap();
        for index in 1..=servers {
            fs::write(
                discovery.join(format!("templates/server{index}.json")),
                format!(
                    "{{\n  \"node_name\": \"acme-discovery-{index}\",\n  \"bind_addr\": \"{{{{ bind_addr }}}}\"\n}}\n"
                ),
            )
            .unwrap();
        }
    }

    /// 全デプロイ単位のビルドコンテキスト（Dockerfile入り）
    pub fn write_build_contexts(&self, services: &[&str]) {
        for dir in ["frontend", "infra/gateway", "infra/dashboard"] {
            let context = self.root.path().join(dir);
            fs::create_dir_all(&context).unwrap();
            fs::write(context.join("Dockerfile"), "FROM alpine:3\n").unwrap();
        }
        for service in services {
            let context = self.root.path().join("services").join(service);
            fs::create_dir_all(&context).unwrap();
            fs::write(context.join("Dockerfile"), "FROM alpine:3\n").unwrap();
        }
    }
}
