use std::sync::Arc;

use colored::Colorize;

use nexus_core::{SolutionConfig, SolutionLayout};
use nexus_exec::ProcessRunner;
use nexus_pipeline::{RunState, assemble_build, assemble_publish};

pub async fn build(config: &SolutionConfig, layout: &SolutionLayout) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("🔨 {} のイメージをビルドします", config.solution).bold()
    );

    let tool = Arc::new(ProcessRunner::new());
    let pipeline = assemble_build(config, layout, tool);
    let state = pipeline.run(RunState::new()).await;

    super::print_summary(&state);
    if !state.succeeded() {
        std::process::exit(1);
    }
    println!();
    println!("  イメージバージョン: {}", state.image_version.cyan());
    Ok(())
}

pub async fn publish(config: &SolutionConfig, layout: &SolutionLayout) -> anyhow::Result<()> {
    println!(
        "{}",
        format!(
            "⬆ {} のイメージを {} へ公開します",
            config.solution,
            config.docker_repository.cyan()
        )
        .bold()
    );

    let tool = Arc::new(ProcessRunner::new());
    let pipeline = assemble_publish(config, layout, tool);
    let state = pipeline.run(RunState::new()).await;

    super::print_summary(&state);
    if !state.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
