use colored::Colorize;

use nexus_core::{SolutionConfig, SolutionLayout};

pub fn handle(config: &SolutionConfig, layout: &SolutionLayout) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    config.validate()?;

    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  ソリューション: {}", config.solution.cyan());
    if config.docker_repository.is_empty() {
        println!("  リポジトリ: {}", "(未設定)".yellow());
    } else {
        println!("  リポジトリ: {}", config.docker_repository.cyan());
    }
    println!(
        "  ディスカバリ: {}台 ({})",
        config.discovery.servers,
        config.discovery.http_addr.cyan()
    );
    println!("  サービス: {}個", config.services.len());
    for service in &config.services {
        let db = service
            .db_port
            .map(|port| format!(", db:{port}"))
            .unwrap_or_default();
        println!("    - {} (port:{}{})", service.name.cyan(), service.port, db);
    }

    if !layout.compose_file().exists() {
        println!(
            "  {} docker-compose.yml がありません（docker ターゲットで必要）",
            "⚠".yellow()
        );
    }
    Ok(())
}
