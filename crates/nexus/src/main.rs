mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use nexus_pipeline::Target;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "マイクロサービス開発環境を1コマンドで構築する", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 新しいソリューションの雛形を作成
    Init {
        /// ソリューション名（小文字・数字・ハイフン）
        name: String,
        /// イメージリポジトリ（例: ghcr.io/acme）
        #[arg(long, default_value = "")]
        repository: String,
        /// 作成先ディレクトリ（省略時はカレント直下の <name>）
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// ソリューションへ構成要素を追加
    #[command(subcommand)]
    Add(AddCommands),
    /// 開発環境を起動
    Run {
        /// 実行ターゲット
        #[arg(value_enum, default_value_t = RunTarget::Local, env = "NEXUS_TARGET")]
        target: RunTarget,
    },
    /// Dockerイメージを操作
    #[command(subcommand)]
    Docker(DockerCommands),
    /// 環境を停止して生成物を削除
    Clean {
        /// 対象ターゲット
        #[arg(value_enum, default_value_t = CleanTarget::Local)]
        target: CleanTarget,
    },
    /// 設定を検証
    Validate,
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum AddCommands {
    /// サービスを追加して成果物の雛形を作成
    Service {
        /// サービス名（小文字・数字・ハイフン）
        name: String,
        /// 公開ポート（省略時は自動採番）
        #[arg(long)]
        port: Option<u16>,
        /// データベース用の公開ポート（指定するとDBコンテナも生成）
        #[arg(long)]
        db_port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum DockerCommands {
    /// 全デプロイ単位のイメージをビルド
    Build,
    /// ビルドしてリポジトリへ公開
    Publish,
}

#[derive(Clone, Copy, ValueEnum)]
enum RunTarget {
    /// サービスはホスト上のプロセス、ディスカバリのみコンテナ
    Local,
    /// すべてコンテナで起動
    Docker,
    /// Kubernetesクラスタへデプロイ
    Cluster,
}

impl From<RunTarget> for Target {
    fn from(target: RunTarget) -> Self {
        match target {
            RunTarget::Local => Target::Local,
            RunTarget::Docker => Target::Docker,
            RunTarget::Cluster => Target::Cluster,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CleanTarget {
    /// ディスカバリ停止と生成物（証明書含む）の削除
    Local,
    /// コンテナ・ネットワーク停止と生成物の削除
    Docker,
}

impl From<CleanTarget> for Target {
    fn from(target: CleanTarget) -> Self {
        match target {
            CleanTarget::Local => Target::Local,
            CleanTarget::Docker => Target::Docker,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    // Version / Init はソリューション設定が無くても動く
    if matches!(cli.command, Commands::Version) {
        println!("nexus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if let Commands::Init {
        name,
        repository,
        path,
    } = &cli.command
    {
        return commands::init::handle(name, repository, path.as_deref());
    }

    // プロジェクトルートを検索
    let project_root = match nexus_core::find_project_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!();
            eprintln!(
                "{}",
                "ヒント: nexus init <name> で新しいソリューションを作成できます".yellow()
            );
            std::process::exit(1);
        }
    };
    let config = nexus_core::load_solution(&project_root)?;
    let layout = nexus_core::SolutionLayout::new(&project_root);

    match cli.command {
        Commands::Run { target } => commands::run::handle(&config, &layout, target.into()).await,
        Commands::Docker(docker) => match docker {
            DockerCommands::Build => commands::docker::build(&config, &layout).await,
            DockerCommands::Publish => commands::docker::publish(&config, &layout).await,
        },
        Commands::Clean { target } => {
            commands::clean::handle(&config, &layout, target.into()).await
        }
        Commands::Add(AddCommands::Service {
            name,
            port,
            db_port,
        }) => commands::add::service(&config, &layout, &name, port, db_port),
        Commands::Validate => commands::validate::handle(&config, &layout),
        Commands::Init { .. } | Commands::Version => unreachable!(),
    }
}
