use std::sync::Arc;

use colored::Colorize;

use nexus_core::{SolutionConfig, SolutionLayout};
use nexus_exec::ProcessRunner;
use nexus_pipeline::{RunState, Target, assemble_clean};

pub async fn handle(
    config: &SolutionConfig,
    layout: &SolutionLayout,
    target: Target,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!(
            "🧹 {} の {} 環境を削除します",
            config.solution,
            target.to_string().cyan()
        )
        .bold()
    );

    let tool = Arc::new(ProcessRunner::new());
    let pipeline = assemble_clean(target, config, layout, tool)?;
    let state = pipeline.run(RunState::new()).await;

    super::print_summary(&state);
    if !state.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
