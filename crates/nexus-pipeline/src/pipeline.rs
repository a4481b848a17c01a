//! Stage trait and the sequential driver.
//!
//! A pipeline is an ordered list of stages. Each stage receives the run
//! state by value and returns it, possibly marked failed; once a stage
//! fails, the remaining stages are skipped.

use async_trait::async_trait;
use colored::Colorize;

use crate::state::{RunState, StepStatus};

#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name shown in run banners and summaries.
    fn name(&self) -> &str;

    async fn execute(&self, state: RunState) -> RunState;
}

/// Ordered stage list for one command invocation.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run the stages in order, stopping after the first hard failure.
    pub async fn run(&self, mut state: RunState) -> RunState {
        for stage in &self.stages {
            println!();
            println!("{}", format!("▶ {} を開始...", stage.name()).cyan().bold());
            tracing::info!(stage = stage.name(), "stage started");
            state = stage.execute(state).await;
            match state.status {
                StepStatus::Success => {
                    println!("{}", format!("✓ {} 完了", stage.name()).green());
                }
                StepStatus::Failure => {
                    println!(
                        "{}",
                        format!("✗ {} が失敗しました。以降のステージを中断します", stage.name())
                            .red()
                            .bold()
                    );
                    tracing::error!(stage = stage.name(), "stage failed, aborting run");
                    break;
                }
            }
        }
        state
    }
}
