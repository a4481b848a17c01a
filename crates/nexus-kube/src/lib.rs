//! kubectl CLI wrapper
//!
//! Wraps the kubectl commands Nexus needs for cluster targets: applying
//! manifests, watching rollouts, and reading job results out of secrets.
//! All invocations go through the `nexus-exec` gateway.

pub mod error;

pub use error::{KubeError, Result};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use nexus_exec::{CommandLine, ToolRunner};
use std::path::Path;
use std::sync::Arc;

/// kubectl CLI client scoped to one namespace
#[derive(Clone)]
pub struct KubectlCli {
    runner: Arc<dyn ToolRunner>,
    namespace: String,
}

impl KubectlCli {
    pub fn new(runner: Arc<dyn ToolRunner>, namespace: impl Into<String>) -> Self {
        Self {
            runner,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = CommandLine::new("kubectl")
            .args(["-n", &self.namespace])
            .args(args.iter().copied());
        let output = self.runner.run(&command).await?;
        Ok(output.stdout)
    }

    /// Apply a manifest file or a directory of manifests
    pub async fn apply(&self, path: &Path) -> Result<()> {
        self.run(&["apply", "-f", &path.display().to_string()]).await?;
        Ok(())
    }

    /// Wait for a deployment to finish rolling out
    pub async fn rollout_status(&self, deployment: &str, timeout_secs: u64) -> Result<()> {
        self.run(&[
            "rollout",
            "status",
            &format!("deployment/{deployment}"),
            &format!("--timeout={timeout_secs}s"),
        ])
        .await?;
        Ok(())
    }

    /// Wait until pods matching the selector report Ready
    pub async fn wait_ready(&self, selector: &str, timeout_secs: u64) -> Result<()> {
        self.run(&[
            "wait",
            "--for=condition=Ready",
            "pod",
            "-l",
            selector,
            &format!("--timeout={timeout_secs}s"),
        ])
        .await?;
        Ok(())
    }

    /// Whether a job has at least one succeeded pod.
    ///
    /// A job that does not exist yet reads as "not succeeded" so callers
    /// can poll right after applying its manifest.
    pub async fn job_succeeded(&self, job: &str) -> Result<bool> {
        let result = self
            .run(&[
                "get",
                "job",
                job,
                "-o",
                "jsonpath={.status.succeeded}",
            ])
            .await;
        match result {
            Ok(stdout) => Ok(stdout.trim() == "1"),
            Err(KubeError::Exec(nexus_exec::ExecError::CommandFailed { stderr, .. }))
                if stderr.contains("NotFound") =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Read and decode one key of a secret. `None` when the secret or the
    /// key does not exist yet.
    pub async fn read_secret(&self, secret: &str, key: &str) -> Result<Option<String>> {
        let result = self
            .run(&[
                "get",
                "secret",
                secret,
                "-o",
                &format!("jsonpath={{.data.{key}}}"),
            ])
            .await;
        let encoded = match result {
            Ok(stdout) => stdout.trim().to_string(),
            Err(KubeError::Exec(nexus_exec::ExecError::CommandFailed { stderr, .. }))
                if stderr.contains("NotFound") =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if encoded.is_empty() {
            return Ok(None);
        }
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| KubeError::SecretDecode {
                secret: secret.to_string(),
                message: e.to_string(),
            })?;
        let value = String::from_utf8(bytes).map_err(|e| KubeError::SecretDecode {
            secret: secret.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nexus_exec::{ExecError, ToolOutput};
    use std::sync::Mutex;
    use std::time::Duration;

    type Handler = Box<dyn Fn(&CommandLine) -> nexus_exec::Result<ToolOutput> + Send + Sync>;

    struct FakeRunner {
        calls: Mutex<Vec<String>>,
        handler: Handler,
    }

    impl FakeRunner {
        fn new(handler: Handler) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                handler,
            })
        }
    }

    #[async_trait]
    impl ToolRunner for FakeRunner {
        async fn run(&self, command: &CommandLine) -> nexus_exec::Result<ToolOutput> {
            self.calls.lock().unwrap().push(command.to_string());
            (self.handler)(command)
        }

        async fn run_with_timeout(
            &self,
            command: &CommandLine,
            _timeout: Duration,
        ) -> nexus_exec::Result<ToolOutput> {
            self.run(command).await
        }
    }

    fn ok(stdout: &str) -> nexus_exec::Result<ToolOutput> {
        Ok(ToolOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    fn not_found() -> nexus_exec::Result<ToolOutput> {
        Err(ExecError::CommandFailed {
            program: "kubectl".to_string(),
            code: Some(1),
            stderr: "Error from server (NotFound): jobs.batch \"orders-token\" not found".to_string(),
        })
    }

    #[tokio::test]
    async fn commands_are_namespaced() {
        let runner = FakeRunner::new(Box::new(|_| ok("")));
        let kube = KubectlCli::new(runner.clone(), "acme");
        kube.apply(Path::new("cluster/deployment.yml")).await.unwrap();

        let calls = runner.calls.lock().unwrap().clone();
        assert_eq!(
            calls[0],
            "kubectl -n acme apply -f cluster/deployment.yml"
        );
    }

    #[tokio::test]
    async fn job_succeeded_reads_status() {
        let runner = FakeRunner::new(Box::new(|_| ok("1")));
        let kube = KubectlCli::new(runner, "acme");
        assert!(kube.job_succeeded("orders-token").await.unwrap());
    }

    #[tokio::test]
    async fn absent_job_is_not_succeeded() {
        let runner = FakeRunner::new(Box::new(|_| not_found()));
        let kube = KubectlCli::new(runner, "acme");
        assert!(!kube.job_succeeded("orders-token").await.unwrap());
    }

    #[tokio::test]
    async fn read_secret_decodes_base64() {
        // "s3cret" を base64 で
        let runner = FakeRunner::new(Box::new(|_| ok("czNjcmV0")));
        let kube = KubectlCli::new(runner, "acme");
        let value = kube.read_secret("orders-token", "token").await.unwrap();
        assert_eq!(value.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn missing_secret_is_none() {
        let runner = FakeRunner::new(Box::new(|_| not_found()));
        let kube = KubectlCli::new(runner, "acme");
        assert_eq!(kube.read_secret("orders-token", "token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_secret_data_is_an_error() {
        let runner = FakeRunner::new(Box::new(|_| ok("!!!not-base64!!!")));
        let kube = KubectlCli::new(runner, "acme");
        assert!(matches!(
            kube.read_secret("orders-token", "token").await,
            Err(KubeError::SecretDecode { .. })
        ));
    }
}
