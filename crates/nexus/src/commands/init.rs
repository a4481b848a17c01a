use std::path::Path;

use colored::Colorize;

use nexus_core::scaffold_solution;

pub fn handle(name: &str, repository: &str, path: Option<&Path>) -> anyhow::Result<()> {
    let root = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?.join(name),
    };

    println!(
        "{}",
        format!("✨ ソリューション {} を作成します", name.cyan()).bold()
    );
    let report = scaffold_solution(&root, name, repository)?;
    for file in &report.created {
        println!("  {} {}", "+".green(), file.display());
    }
    for file in &report.updated {
        println!("  {} {}", "~".yellow(), file.display());
    }

    println!();
    println!("{}", "✓ 作成しました。次のコマンドで起動できます:".green());
    println!("  cd {} && nexus run", root.display().to_string().cyan());
    Ok(())
}
