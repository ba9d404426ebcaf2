use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use autobak::{
    config::ConfigStore,
    driver,
    layout::DataLayout,
    scheduler::{AutosaveScheduler, BackupOutcome, SaveTrigger},
    trigger::{NoopTrigger, ShellTrigger},
    writer::BackupWriter,
    Configuration,
};
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "autobak")]
#[command(about = "Autosave on a timer and keep timestamped backups of every change.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data directory holding the working file and the backups
    #[arg(long, env = "AUTOBAK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Working file to back up (defaults to designs/__editor__.xml in the data directory)
    #[arg(long, global = true)]
    working_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the autosave/backup scheduler (default)
    Run {
        /// Command that makes the host write its working file
        #[arg(short, long)]
        save_command: Option<String>,
        /// Clock tick in milliseconds
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,
    },
    /// Attempt a single backup now
    Backup,
    /// List existing backups, oldest first
    List,
    /// Show the effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut layout = cli.data_dir.map(DataLayout::new).unwrap_or_else(DataLayout::user_default);
    if let Some(path) = &cli.working_file {
        layout = layout.with_working_file(path);
    }

    match cli.command {
        Some(Commands::Run { save_command, tick_ms }) => {
            let tick = Duration::from_millis(tick_ms.max(1));
            match save_command {
                Some(line) => {
                    let trigger = ShellTrigger::parse(&line).context("invalid --save-command")?;
                    run_scheduler(&layout, trigger, tick).await?
                }
                None => run_scheduler(&layout, NoopTrigger, tick).await?,
            }
        }
        Some(Commands::Backup) => backup_once(&layout)?,
        Some(Commands::List) => list_backups(&layout)?,
        Some(Commands::Config) => show_config(&layout)?,
        None => run_scheduler(&layout, NoopTrigger, driver::DEFAULT_TICK).await?,
    }

    Ok(())
}

async fn run_scheduler<T: SaveTrigger>(layout: &DataLayout, trigger: T, tick: Duration) -> anyhow::Result<()> {
    info!("🚀 Starting autobak, watching {}", layout.working_file.display());

    let config = ConfigStore::new(&layout.config_file).load();
    let writer = BackupWriter::new(&layout.archive_dir);
    let mut scheduler = AutosaveScheduler::new(config, &layout.working_file, writer, trigger);
    scheduler.start();

    println!("Type 'backup' to back up now, 'help' for more.");
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    driver::run(&mut scheduler, tick, BufReader::new(tokio::io::stdin()), shutdown)
        .await
        .context("scheduler loop stopped")?;

    let stats = scheduler.stats();
    info!(
        "Stopped after {} autosaves and {} backups ({} failed attempts)",
        stats.autosaves, stats.written, stats.failed
    );
    Ok(())
}

fn backup_once(layout: &DataLayout) -> anyhow::Result<()> {
    let writer = BackupWriter::new(&layout.archive_dir);
    writer
        .ensure_dir()
        .with_context(|| format!("cannot create {}", layout.archive_dir.display()))?;
    let mut scheduler = AutosaveScheduler::new(Configuration::default(), &layout.working_file, writer, NoopTrigger);

    match scheduler.attempt_backup().context("backup failed")? {
        BackupOutcome::Written(name) => println!("✅ Backup written: {}", layout.archive_dir.join(name).display()),
        BackupOutcome::Unchanged => println!("No backup written: content unchanged"),
    }
    Ok(())
}

fn list_backups(layout: &DataLayout) -> anyhow::Result<()> {
    let backups = BackupWriter::new(&layout.archive_dir).list()?;

    println!("Backups in {}:", layout.archive_dir.display());
    println!("{}", "─".repeat(50));
    for path in &backups {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        println!("{}  {:>10} bytes", name, size);
    }
    println!("{} backup(s)", backups.len());
    Ok(())
}

fn show_config(layout: &DataLayout) -> anyhow::Result<()> {
    let store = ConfigStore::new(&layout.config_file);
    let config = store.load();

    println!("Settings file: {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    if !config.backups_enabled() {
        println!("Backups are disabled (backup interval is zero or negative).");
    }
    Ok(())
}
