//! Activity Tracker CLI
//!
//! Real-time desktop activity tracker with productivity categorization.

use activity_tracker::{
    aggregate::AggregationService,
    categorizer::CategoryRuleTable,
    config::Config,
    hub::BroadcastHub,
    log::{CsvLog, PersistentLog},
    probe::default_probe,
    report::render_report,
    sampler::Sampler,
    server::{self, AppState, ServerConfig},
    state::TrackerState,
    VERSION,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long broadcast deliveries get to drain after a shutdown notice.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "activity-tracker")]
#[command(version = VERSION)]
#[command(about = "Real-time desktop activity tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking and serve the control API
    Start {
        /// Address to bind the control server to
        #[arg(long)]
        host: Option<String>,

        /// Port for the control server
        #[arg(long)]
        port: Option<u16>,

        /// Seconds between sampling ticks
        #[arg(long)]
        interval: Option<u64>,

        /// Path to the category rules file
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print a summary report from the activity log
    Report {
        /// Activity log to analyze (defaults to the configured log)
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Show tracker configuration and log statistics
    Status,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            host,
            port,
            interval,
            rules,
        } => cmd_start(host, port, interval, rules).await,
        Commands::Report { log } => {
            cmd_report(log);
            Ok(())
        }
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Config => {
            cmd_config();
            Ok(())
        }
    }
}

async fn cmd_start(
    host: Option<String>,
    port: Option<u16>,
    interval: Option<u64>,
    rules_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "activity_tracker=info".into()),
        )
        .init();

    println!("Activity Tracker v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(interval) = interval {
        config.check_interval_secs = interval;
    }
    if let Some(rules_path) = rules_path {
        config.rules_path = rules_path;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let rules = CategoryRuleTable::load_or_default(&config.rules_path);
    if rules.is_empty() {
        println!("No category rules loaded; everything will fall back to \"Other\".");
    } else {
        println!(
            "Loaded {} app rule(s) and {} title rule(s)",
            rules.app_rules.len(),
            rules.title_rules.len()
        );
    }
    println!("  Log file: {:?}", config.log_path);
    println!("  Check interval: {}s", config.check_interval_secs);

    let interval = config.check_interval();
    let log: Arc<dyn PersistentLog> = Arc::new(CsvLog::new(config.log_path.clone()));
    let state = Arc::new(TrackerState::new());
    let hub = Arc::new(BroadcastHub::new(
        Arc::clone(&state),
        AggregationService::new(Arc::clone(&log), interval),
    ));
    let aggregator = Arc::new(AggregationService::new(Arc::clone(&log), interval));

    // Sampler thread, stopped via the crossbeam channel between ticks.
    let (sampler_stop_tx, sampler_stop_rx) = crossbeam_channel::bounded::<()>(1);
    let sampler = Sampler::new(
        default_probe(),
        rules,
        Arc::clone(&log),
        Arc::clone(&state),
        Arc::clone(&hub),
        interval,
    );
    let sampler_handle = std::thread::spawn(move || sampler.run(sampler_stop_rx));

    // Shutdown requests come from POST /shutdown and from Ctrl+C.
    let (shutdown_req_tx, mut shutdown_req_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let ctrlc_tx = shutdown_req_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(());
    })
    .expect("Error setting Ctrl+C handler");

    let app = Arc::new(AppState {
        state: Arc::clone(&state),
        hub: Arc::clone(&hub),
        aggregator,
        shutdown_requests: shutdown_req_tx,
    });

    let server_config = ServerConfig::new(config.host.clone(), config.port);
    let (addr, server_stop_tx) = server::run(server_config, app).await?;

    println!();
    println!("Dashboard API available at http://{addr}");
    println!("Press Ctrl+C to stop");

    // Block until someone asks us to stop.
    let _ = shutdown_req_rx.recv().await;

    println!();
    println!("Shutting down...");
    hub.notify_shutdown("Server shutting down");
    tokio::time::sleep(SHUTDOWN_GRACE).await;

    let _ = sampler_stop_tx.send(());
    if sampler_handle.join().is_err() {
        eprintln!("Warning: sampler thread panicked");
    }
    let _ = server_stop_tx.send(());

    println!("Stopped.");
    Ok(())
}

fn cmd_report(log_path: Option<PathBuf>) {
    let config = Config::load().unwrap_or_default();
    let log_path = log_path.unwrap_or_else(|| config.log_path.clone());

    println!("Activity Reporter");
    println!("{}", "=".repeat(30));

    if !log_path.exists() {
        println!("Activity log {log_path:?} not found.");
        println!("Run 'activity-tracker start' to begin recording activity.");
        return;
    }

    let log: Arc<dyn PersistentLog> = Arc::new(CsvLog::new(log_path));
    let aggregator = AggregationService::new(log, config.check_interval());
    println!("{}", render_report(&aggregator.aggregate()));
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Activity Tracker Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    println!("  Check interval: {}s", config.check_interval_secs);
    println!("  Server address: {}:{}", config.host, config.port);
    println!("  Rules file: {:?}", config.rules_path);
    println!("  Log file: {:?}", config.log_path);
    println!();

    let log = CsvLog::new(config.log_path.clone());
    match log.read_all() {
        Ok(samples) if samples.is_empty() => {
            println!("No recorded activity yet.");
        }
        Ok(samples) => {
            println!("Recorded samples: {}", samples.len());
            if let Some(first) = samples.first() {
                println!("  First: {}", first.timestamp.format("%Y-%m-%d %H:%M:%S"));
            }
            if let Some(last) = samples.last() {
                println!("  Last:  {}", last.timestamp.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        Err(e) => {
            println!("Could not read activity log: {e}");
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
