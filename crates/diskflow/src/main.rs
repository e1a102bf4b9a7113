mod commands;
mod job;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diskflow")]
#[command(about = "クラウドディスクのバックアップとリストアを、取り残しなく。", long_about = None)]
struct Cli {
    /// 設定ファイルのパス（省略時は自動検索）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 詳細なログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 終了時にインベントリを JSON で標準出力に出力
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 認証状態を確認
    Auth,
    /// スナップショットを管理
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
    /// ボリュームを管理
    #[command(subcommand)]
    Volume(VolumeCommands),
    /// ボリュームをインスタンスにアタッチ
    Attach {
        /// ボリュームID
        #[arg(long)]
        volume: String,
        /// インスタンスID（省略時は設定ファイルの instance_id）
        #[arg(long)]
        instance: Option<String>,
    },
    /// ボリュームをインスタンスからデタッチ
    Detach {
        /// ボリュームID
        #[arg(long)]
        volume: String,
        /// インスタンスID（省略時は設定ファイルの instance_id）
        #[arg(long)]
        instance: Option<String>,
    },
    /// スナップショットからボリュームを作成してアタッチ
    /// アタッチに失敗した場合は作成したボリュームを削除
    Restore {
        /// 復元元のスナップショットID
        #[arg(long)]
        snapshot: String,
        /// ボリュームサイズ (GB)
        #[arg(long)]
        size: u64,
        /// インスタンスID（省略時は設定ファイルの instance_id）
        #[arg(long)]
        instance: Option<String>,
        /// 表示するパーティション番号
        #[arg(long)]
        partition: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// スナップショットを作成
    Create {
        /// 対象ボリュームID
        #[arg(long)]
        volume: String,
        /// 説明
        #[arg(long)]
        description: Option<String>,
    },
    /// スナップショットを削除
    Delete {
        /// スナップショットID
        id: String,
    },
    /// スナップショットの状態を表示
    Show {
        /// スナップショットID
        id: String,
    },
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// ボリュームを作成
    Create {
        /// ボリュームサイズ (GB)
        #[arg(long)]
        size: u64,
        /// 復元元のスナップショットID
        #[arg(long)]
        snapshot: Option<String>,
        /// ディスクカテゴリ（省略時は設定ファイルの値）
        #[arg(long)]
        category: Option<String>,
    },
    /// ボリュームを削除
    Delete {
        /// ボリュームID
        id: String,
    },
    /// ボリュームの状態を表示
    Show {
        /// ボリュームID
        id: String,
    },
    /// インスタンスにアタッチされたボリュームを一覧表示
    List {
        /// インスタンスID（省略時は設定ファイルの instance_id）
        #[arg(long)]
        instance: Option<String>,
    },
}

impl Commands {
    /// 新しいボリュームを作成するコマンドのみゾーンが必要
    fn creates_volume(&self) -> bool {
        matches!(
            self,
            Commands::Volume(VolumeCommands::Create { .. }) | Commands::Restore { .. }
        )
    }

    fn instance_flag(&self) -> Option<&str> {
        match self {
            Commands::Attach { instance, .. }
            | Commands::Detach { instance, .. }
            | Commands::Restore { instance, .. }
            | Commands::Volume(VolumeCommands::List { instance }) => instance.as_deref(),
            _ => None,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout は --json の出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "中断しています...".yellow());
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("diskflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (path, settings) = diskflow_config::load(cli.config.as_deref())?;
    tracing::debug!(path = %path.display(), "Loaded settings");

    // Ctrl-C でジョブをキャンセル（ゾーン解決や待機中のポーリングを中断）
    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    let placement = if cli.command.creates_volume() {
        cli.command
            .instance_flag()
            .map(str::to_string)
            .or_else(|| settings.provider.instance_id.clone())
    } else {
        None
    };
    let job = job::Job::connect(settings, placement.as_deref(), cancel, cli.json).await?;

    let result = match cli.command {
        Commands::Auth => commands::auth::handle(&job).await,
        Commands::Snapshot(SnapshotCommands::Create {
            volume,
            description,
        }) => commands::snapshot::create(&job, volume, description).await,
        Commands::Snapshot(SnapshotCommands::Delete { id }) => {
            commands::snapshot::delete(&job, &id).await
        }
        Commands::Snapshot(SnapshotCommands::Show { id }) => {
            commands::snapshot::show(&job, &id).await
        }
        Commands::Volume(VolumeCommands::Create {
            size,
            snapshot,
            category,
        }) => commands::volume::create(&job, size, snapshot, category).await,
        Commands::Volume(VolumeCommands::Delete { id }) => {
            commands::volume::delete(&job, &id).await
        }
        Commands::Volume(VolumeCommands::Show { id }) => commands::volume::show(&job, &id).await,
        Commands::Volume(VolumeCommands::List { instance }) => {
            commands::volume::list(&job, instance).await
        }
        Commands::Attach { volume, instance } => {
            commands::attach::attach(&job, &volume, instance).await
        }
        Commands::Detach { volume, instance } => {
            commands::attach::detach(&job, &volume, instance).await
        }
        Commands::Restore {
            snapshot,
            size,
            instance,
            partition,
        } => commands::restore::handle(&job, &snapshot, size, instance, partition).await,
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    };

    if cli.json {
        let report = job.orchestrator.inventory().report();
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    result
}
