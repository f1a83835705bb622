//! filevalet - an automated file organizer.
//!
//! Usage:
//!   fv run --config rules.json      Watch folders and apply rules until interrupted
//!   fv scan --config rules.json     One-shot pass over every configured folder
//!   fv test --config rules.json --rule <ID> <FILE>
//!                                   Dry-run one rule against one file
//!   fv sweep --config rules.json    One-shot trash eviction sweep
//!   fv --help                       Show help
//!
//! The config file is a JSON snapshot of folders, rules and the trash
//! policy; in a desktop deployment the GUI layer publishes the same
//! snapshot in-process.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::info;
use tracing_subscriber::EnvFilter;

use filevalet_core::{ConfigSnapshot, Rule, SnapshotStore};
use filevalet_ops::{ActionExecutor, EvictionManager, TrashBin};
use filevalet_rules::{AlwaysConfirm, Confirm, NeverConfirm, RuleEngine};
use filevalet_watch::{Monitor, MonitorConfig, MonitorEvent, Scheduler};

#[derive(Parser)]
#[command(
    name = "filevalet",
    version,
    about = "An automated file organizer",
    long_about = "filevalet watches folders, evaluates your rules against files \
                  that appear or change, and moves, copies, renames, recycles, \
                  deletes or opens them accordingly. It also keeps the trash bin \
                  under control by age, size and schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the configured folders and apply rules until interrupted
    Run {
        /// Config snapshot (folders, rules, trash policy) as JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Trash bin directory (defaults to the user data dir)
        #[arg(long)]
        trash_dir: Option<PathBuf>,

        /// Auto-approve rules that ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Run one pass over every configured folder, then exit
    Scan {
        /// Config snapshot as JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Trash bin directory (defaults to the user data dir)
        #[arg(long)]
        trash_dir: Option<PathBuf>,

        /// Auto-approve rules that ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Dry-run one rule against one file; nothing is executed
    Test {
        /// Config snapshot as JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Rule id to test
        #[arg(short, long)]
        rule: String,

        /// File to test the rule against
        file: PathBuf,
    },

    /// Run one trash eviction sweep, then exit
    Sweep {
        /// Config snapshot as JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Trash bin directory (defaults to the user data dir)
        #[arg(long)]
        trash_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            trash_dir,
            yes,
        } => run(&config, trash_dir, yes).await,
        Command::Scan {
            config,
            trash_dir,
            yes,
        } => scan(&config, trash_dir, yes).await,
        Command::Test { config, rule, file } => test_rule(&config, &rule, &file),
        Command::Sweep { config, trash_dir } => sweep(&config, trash_dir),
    }
}

/// Load and validate the config snapshot.
fn load_snapshot(path: &PathBuf) -> Result<ConfigSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let snapshot: ConfigSnapshot =
        serde_json::from_str(&contents).context("config is not a valid snapshot")?;
    snapshot.validate().context("config failed validation")?;
    Ok(snapshot)
}

fn open_bin(trash_dir: Option<PathBuf>) -> Result<Arc<TrashBin>> {
    let root = trash_dir.unwrap_or_else(TrashBin::default_root);
    Ok(Arc::new(
        TrashBin::open(root).context("cannot open trash bin")?,
    ))
}

fn build_engine(bin: Arc<TrashBin>, yes: bool) -> Arc<RuleEngine> {
    let confirm: Arc<dyn Confirm> = if yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(NeverConfirm)
    };
    Arc::new(RuleEngine::new(ActionExecutor::new(bin), confirm))
}

/// Watch folders and tick the scheduler until ctrl-c.
async fn run(config: &PathBuf, trash_dir: Option<PathBuf>, yes: bool) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let folders = snapshot.folders.clone();

    let bin = open_bin(trash_dir)?;
    let engine = build_engine(bin.clone(), yes);
    let store = Arc::new(SnapshotStore::new(snapshot));
    let monitor_config = MonitorConfig::default();
    let period = monitor_config.scan_period;
    let monitor = Monitor::new(engine, store.clone(), monitor_config)?;

    // Render notifications as they arrive.
    let mut events = monitor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                MonitorEvent::Outcomes { outcomes, .. } => {
                    for outcome in outcomes {
                        println!(
                            "{} [{}] {}",
                            outcome.path.display(),
                            outcome.rule_name,
                            outcome.status
                        );
                    }
                }
                MonitorEvent::FolderUnavailable { path, reason } => {
                    eprintln!("folder unavailable: {}: {reason}", path.display());
                }
            }
        }
    });

    for folder in &folders {
        monitor.add_folder(&folder.path, folder.recursive).await?;
    }
    monitor.start().await;

    let scheduler = Scheduler::spawn(
        monitor.clone(),
        Arc::new(EvictionManager::new(bin)),
        store,
        period,
    );

    info!(folders = folders.len(), "watching; press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("signal handling")?;

    scheduler.shutdown().await;
    monitor.stop().await;
    Ok(())
}

/// One pass over every configured folder.
async fn scan(config: &PathBuf, trash_dir: Option<PathBuf>, yes: bool) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let folders = snapshot.folders.clone();

    let bin = open_bin(trash_dir)?;
    let engine = build_engine(bin, yes);
    let store = Arc::new(SnapshotStore::new(snapshot));
    let monitor = Monitor::new(engine, store, MonitorConfig::default())?;

    let mut acted = 0usize;
    for folder in &folders {
        let outcomes = monitor.scan_folder_now(&folder.path).await?;
        for outcome in &outcomes {
            println!(
                "{} [{}] {}",
                outcome.path.display(),
                outcome.rule_name,
                outcome.outcome.summary()
            );
        }
        acted += outcomes.len();
    }
    println!("{acted} file(s) acted on across {} folder(s)", folders.len());
    Ok(())
}

/// Dry-run one rule against one file.
fn test_rule(config: &PathBuf, rule_id: &str, file: &PathBuf) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let rule: &Rule = snapshot
        .folders
        .iter()
        .flat_map(|f| f.rules.iter())
        .find(|r| r.id.0 == rule_id)
        .ok_or_else(|| eyre!("no rule with id '{rule_id}'"))?;

    let bin = open_bin(None)?;
    let engine = build_engine(bin, false);
    let result = engine.test_rule(file, rule);

    println!(
        "{} {} rule '{}'",
        file.display(),
        if result.matched { "matches" } else { "does not match" },
        rule.name
    );
    for (condition, verdict) in rule.conditions.iter().zip(&result.conditions) {
        println!("  [{}] {condition}", if *verdict { "x" } else { " " });
    }
    Ok(())
}

/// One trash eviction sweep.
fn sweep(config: &PathBuf, trash_dir: Option<PathBuf>) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let Some(policy) = snapshot.trash_policy else {
        println!("no trash policy configured; nothing to do");
        return Ok(());
    };

    let bin = open_bin(trash_dir)?;
    let manager = EvictionManager::new(bin);
    let results = manager.run_sweep(&policy);

    for result in &results {
        println!(
            "{} ({}) {}",
            result.entry.original_path.display(),
            result.cause,
            result.outcome.summary()
        );
    }
    println!("{} entries evicted", results.len());
    Ok(())
}
