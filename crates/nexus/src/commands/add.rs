use colored::Colorize;

use nexus_core::{ServiceConfig, SolutionConfig, SolutionLayout, save_solution, scaffold_service};

pub fn service(
    config: &SolutionConfig,
    layout: &SolutionLayout,
    name: &str,
    port: Option<u16>,
    db_port: Option<u16>,
) -> anyhow::Result<()> {
    let mut updated = config.clone();
    let port = port.unwrap_or_else(|| updated.next_service_port());
    let mut service = ServiceConfig::new(name, port);
    service.db_port = db_port;
    updated.services.push(service.clone());

    // 名前の形式・重複・ポート衝突をまとめて検査
    updated.validate()?;

    println!(
        "{}",
        format!("➕ サービス {} を追加します (port: {})", name.cyan(), port).bold()
    );
    let report = scaffold_service(layout.root(), &updated, &service)?;
    for file in &report.created {
        println!("  {} {}", "+".green(), file.display());
    }
    for file in &report.updated {
        println!("  {} {}", "~".yellow(), file.display());
    }
    save_solution(layout.root(), &updated)?;

    println!();
    println!("{}", "✓ 追加しました".green());
    if let Some(db_port) = db_port {
        println!("  データベースポート: {}", db_port.to_string().cyan());
    }
    Ok(())
}
