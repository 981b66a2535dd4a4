//! Hearth Bridge - entry point
//!
//! Without a subcommand the process serves MCP over stdio until stdin closes.
//! stdout carries protocol frames only; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hearth_bridge::{export_snapshot, AnalysisBridge, BridgeConfig, McpServer, SnapshotStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hearth-bridge")]
#[command(about = "Capability bridge between the Hearth family app and AI hosts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, env = "HEARTH_LOG", default_value = "info")]
    log_level: String,

    /// Optional TOML configuration file
    #[arg(long, env = "HEARTH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,

    /// Sanitize a raw snapshot JSON file into the input snapshot path
    Export {
        /// Raw snapshot produced by the app
        file: PathBuf,
    },

    /// Run the drift analyzer once and print the result
    Analyze,

    /// Delete both snapshot files
    Cleanup,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "hearth_bridge={}",
            level.as_str().to_lowercase()
        )))
        .with_target(false)
        .with_writer(std::io::stderr) // stdout is reserved for protocol frames
        .init();

    let config = BridgeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(
                "Snapshot directory: {:?} (analysis enabled: {})",
                config.base_dir, config.enable_analysis
            );
            Arc::new(McpServer::from_config(&config)).run().await?;
        }
        Commands::Export { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let raw: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;

            let store = SnapshotStore::new(&config);
            let path = export_snapshot(&store, &raw).await?;
            println!("{}", path.display());
        }
        Commands::Analyze => {
            let store = Arc::new(SnapshotStore::new(&config));
            let result = AnalysisBridge::new(&config, store).run_analysis().await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Cleanup => {
            SnapshotStore::new(&config).cleanup().await;
            info!("Removed snapshot files from {:?}", config.base_dir);
        }
    }

    Ok(())
}
