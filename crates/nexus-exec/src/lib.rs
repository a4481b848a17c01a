//! External tool execution gateway.
//!
//! Every developer CLI Nexus drives (docker, kubectl, mkcert) is invoked
//! through the [`ToolRunner`] trait, so nothing else in the workspace touches
//! the process boundary directly. Tests substitute a scripted runner.

pub mod error;

pub use error::{ExecError, Result};

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// Timeout for long-running invocations such as image builds and compose pulls.
pub const LONG_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// A fully described external command invocation.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the invocation. Defaults to the current one.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Gateway for running external tools and capturing their output.
///
/// A non-zero exit status is always an error carrying the tool's stderr;
/// callers never have to remember to check it themselves.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion and return its captured output.
    async fn run(&self, command: &CommandLine) -> Result<ToolOutput>;

    /// Like [`ToolRunner::run`] but gives up after `timeout`.
    async fn run_with_timeout(
        &self,
        command: &CommandLine,
        timeout: Duration,
    ) -> Result<ToolOutput>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    async fn capture(&self, command: &CommandLine) -> Result<std::process::Output> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(command = %command, "Running external tool");
        cmd.output().await.map_err(|source| ExecError::Spawn {
            program: command.program.clone(),
            source,
        })
    }

    fn interpret(command: &CommandLine, output: std::process::Output) -> Result<ToolOutput> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            tracing::debug!(
                command = %command,
                code = ?output.status.code(),
                "External tool failed"
            );
            return Err(ExecError::CommandFailed {
                program: command.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(ToolOutput { stdout, stderr })
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
        let output = self.capture(command).await?;
        Self::interpret(command, output)
    }

    async fn run_with_timeout(
        &self,
        command: &CommandLine,
        timeout: Duration,
    ) -> Result<ToolOutput> {
        match tokio::time::timeout(timeout, self.capture(command)).await {
            Ok(output) => Self::interpret(command, output?),
            // tokio's Command::output kills the child when its future is dropped
            Err(_) => Err(ExecError::Timeout {
                program: command.program.clone(),
                secs: timeout.as_secs(),
            }),
        }
    }
}
