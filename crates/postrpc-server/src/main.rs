//! postrpc server - serves the built-in functions over HTTP POST.

use anyhow::Result;
use clap::Parser;
use postrpc::config::ServerConfig;
use postrpc::Dispatcher;
use postrpc_server::{build_registry, start_server};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "postrpc-server")]
#[command(about = "Serve named functions over HTTP POST")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Path of the RPC endpoint
    #[arg(long, default_value = ServerConfig::DEFAULT_PATH)]
    path: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Functions to expose, comma separated (defaults to all)
    #[arg(long, value_delimiter = ',')]
    expose: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting postrpc server");

    let registry = build_registry(&args.expose)?;
    let dispatcher = Dispatcher::new(registry);

    let addr = start_server(dispatcher, &args.host, args.port, &args.path).await?;

    // Parent processes read the bound port from stdout
    println!("RPC_PORT={}", addr.port());

    info!("RPC endpoint: http://{}{}", addr, args.path);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
