use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use motion_ledger::api::rest::{AppState, RestApi};
use motion_ledger::config::{self, Config, LedgerBackend};
use motion_ledger::db::repositories::LedgerRepository;
use motion_ledger::db::DatabaseService;
use motion_ledger::events::ReconciliationEngine;
use motion_ledger::ledger::{MemoryLedger, RecordStore};
use motion_ledger::maintenance::StorageCleanupService;
use motion_ledger::messaging::{ChatChannel, LineWorksBot, MotionMessages};
use motion_ledger::services::{admin, Relay};
use motion_ledger::storage::{FileResolver, LocalDrive};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "motion-ledger")]
#[command(about = "motionEye webhook relay with an event ledger", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the webhook server and the maintenance loop
    Serve,
    /// Drop and recreate the ledger
    RebuildLedger,
    /// Trash upload folders older than the configured retention
    Cleanup,
    /// Report what a zero-day cleanup would remove, without removing it
    CleanupReport,
    /// Alert the channel when free space is below the threshold
    CheckStorage,
    /// Send one message of each kind to the channel
    TestSend,
}

/// The ledger store, plus the database behind it when there is one
async fn open_store(config: &Config) -> Result<(Arc<dyn RecordStore>, Option<Arc<DatabaseService>>)> {
    match config.ledger.backend {
        LedgerBackend::Memory => {
            // nothing survives a restart, so start from an empty ledger
            let store = MemoryLedger::new();
            store.rebuild(&config.ledger).await?;
            info!("Using in-memory ledger {}", config.ledger.name);
            let store: Arc<dyn RecordStore> = Arc::new(store);
            Ok((store, None))
        }
        LedgerBackend::Postgres => {
            let db = Arc::new(DatabaseService::new(&config.database).await?);
            let store: Arc<dyn RecordStore> = Arc::new(LedgerRepository::new(db.pool.clone()));
            Ok((store, Some(db)))
        }
    }
}

fn open_messages(config: &Config) -> Result<MotionMessages> {
    let bot = LineWorksBot::new(&config.bot)?;
    let channel = ChatChannel::new(
        Arc::new(bot),
        Duration::from_secs(config.bot.send_lock_timeout_secs),
    );
    Ok(MotionMessages::new(Arc::new(channel)))
}

fn maintenance(config: &Config, drive: Arc<LocalDrive>) -> StorageCleanupService {
    let root = drive.root_id();
    StorageCleanupService::new(config.maintenance.clone(), config.storage.clone(), drive, root)
}

async fn serve(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.storage.root_folder)?;

    let (store, database) = open_store(&config).await?;
    let drive = Arc::new(LocalDrive::new(&config.storage, &config.api.public_base_url));
    let messages = open_messages(&config)?;

    let engine = ReconciliationEngine::new(store.clone(), FileResolver::new(drive.clone()));
    let relay = Relay::new(engine, config.ledger.clone(), drive.root_id(), messages.clone());

    let storage_cleanup = Arc::new(maintenance(&config, drive).with_messages(messages));
    storage_cleanup.start();

    let state = AppState {
        relay,
        store,
        ledger: config.ledger.clone(),
        database,
    };
    let http_server = RestApi::new(&config.api, config.storage.root_folder.clone(), state);

    tokio::select! {
        result = http_server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }
    Ok(())
}

async fn run_app(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.api.log_level))
        .init();
    info!("Configuration loaded");

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::RebuildLedger => {
            let (store, _) = open_store(&config).await?;
            admin::rebuild_ledger(store.as_ref(), &config.ledger).await
        }
        Commands::Cleanup => {
            let drive = Arc::new(LocalDrive::new(&config.storage, &config.api.public_base_url));
            if let Some(report) = maintenance(&config, drive).cleanup().await? {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Commands::CleanupReport => {
            let drive = Arc::new(LocalDrive::new(&config.storage, &config.api.public_base_url));
            let report = maintenance(&config, drive).cleanup_report().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("total: {}GB", report.total_gb());
            Ok(())
        }
        Commands::CheckStorage => {
            let drive = Arc::new(LocalDrive::new(&config.storage, &config.api.public_base_url));
            let messages = open_messages(&config)?;
            if let Some(alert) = maintenance(&config, drive)
                .with_messages(messages)
                .check_free_space()
                .await?
            {
                println!("{}", alert);
            }
            Ok(())
        }
        Commands::TestSend => admin::test_send(&open_messages(&config)?).await,
    }
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app(cli)) {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
