use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// PubChem server for the Model Context Protocol
///
/// Exposes the PubChem PUG REST API to MCP clients over stdio.
#[derive(Parser, Debug)]
#[command(name = "pubchem-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// If not specified, looks for:
    /// 1. ./.pubchem-mcp.toml
    /// 2. $PUBCHEM_MCP_CONFIG
    /// 3. <config dir>/pubchem-mcp/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// PubChem REST base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // stdout carries the protocol
    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match pubchem_mcp::ConfigLoader::new(args.config).load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Setup logging
    let log_level = args
        .log_level
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    setup_logging(&log_level, args.log_file)?;

    info!("Starting pubchem-mcp v{}", env!("CARGO_PKG_VERSION"));
    if let Some(source) = &config.source {
        info!("Configuration loaded from {}", source.display());
    }

    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.client.timeout_secs = timeout_secs;
    }
    pubchem_mcp::ConfigLoader::validate(&config.client)?;

    info!(
        "PubChem endpoint: {} (timeout {}s)",
        config.client.base_url, config.client.timeout_secs
    );

    let client = pubchem_mcp::PubChemClient::from_settings(&config.client)?;
    let mcp_server = pubchem_mcp::McpServer::new(client)?;

    info!("pubchem-mcp ready to accept MCP requests on stdio");

    // Run until the client disconnects or we are told to stop
    tokio::select! {
        result = mcp_server.run() => match result {
            Ok(()) => info!("MCP server stopped normally"),
            Err(e) => {
                eprintln!("MCP server error: {}", e);
                return Err(e);
            }
        },
        _ = shutdown_signal() => {
            info!("Shutting down");
            // stdin is read on a blocking thread the runtime cannot cancel
            let _ = std::io::stdout().flush();
            info!("pubchem-mcp shut down successfully");
            std::process::exit(0);
        }
    }

    info!("pubchem-mcp shut down successfully");

    Ok(())
}
