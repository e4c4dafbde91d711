//! DocBridge - Watch documentation folders and broadcast markdown changes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docbridge::config::{ConfigLoader, DocBridgeConfig};
use docbridge::DocBridge;

#[derive(Parser)]
#[command(
    name = "docbridge",
    about = "Watch documentation folders and stream markdown changes",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and WebSocket server.
    Serve {
        /// Config file to load instead of the default search paths.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind.
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding the folder registry database.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Use the polling watcher backend.
        #[arg(long)]
        polling: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    polling: bool,
) -> Result<DocBridgeConfig, docbridge::config::ConfigError> {
    let loader = config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }
    if polling {
        config.watcher.use_polling = true;
    }

    Ok(config)
}

async fn run_server(config: DocBridgeConfig) -> Result<(), docbridge::AppError> {
    let app = DocBridge::start(config).await?;

    let shutdown = app.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        shutdown.cancel();
    });

    let result = app.serve().await;
    app.stop().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            polling,
        } => {
            let config = match load_config(config, host, port, data_dir, polling) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load configuration");
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            };

            tracing::info!(
                host = %config.server.host,
                port = config.server.port,
                data_dir = %config.storage.data_dir.display(),
                polling = config.watcher.use_polling,
                "Starting DocBridge"
            );

            if let Err(e) = run_server(config).await {
                tracing::error!(error = %e, "DocBridge exited with an error");
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
