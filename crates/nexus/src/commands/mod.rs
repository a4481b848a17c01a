pub mod add;
pub mod clean;
pub mod docker;
pub mod init;
pub mod run;
pub mod validate;

use colored::Colorize;
use nexus_pipeline::RunState;

/// 実行結果のサマリーを表示する
pub fn print_summary(state: &RunState) {
    println!();
    if state.succeeded() {
        println!("{}", "✓ すべてのステージが完了しました".green().bold());
    } else {
        println!("{}", "✗ 実行は失敗しました".red().bold());
    }

    if !state.service_urls.is_empty() {
        println!();
        println!("{}", "サービスURL:".bold());
        let mut urls: Vec<_> = state.service_urls.iter().collect();
        urls.sort();
        for (name, url) in urls {
            println!("  {} {}", format!("{name}:").cyan(), url);
        }
    }

    if !state.errors.is_empty() {
        println!();
        println!(
            "{}",
            format!("⚠ 記録されたエラー: {}件", state.errors.len()).yellow()
        );
        for error in &state.errors {
            println!("  • {error}");
        }
    }
}
