use std::io;
use std::path::PathBuf;

use clap::Parser;

use bot_server::logging::init_logging;
use bot_server::server::run_server;
use bot_server::state::StorageBackend;

#[derive(Parser, Debug, Clone)]
#[command(name = "bot-server")]
#[command(about = "Chat bot state server")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Server port
    #[arg(long, env = "PORT", default_value = "8082")]
    port: u16,

    /// User store backend (memory or file)
    #[arg(long, env = "STORAGE", value_enum, default_value = "file")]
    storage: StorageBackend,

    /// Directory for the file store
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.log_level.is_some() {
        env_logger::init();
    } else {
        init_logging(cli.debug);
    }

    log::info!("Starting bot server on port {}", cli.port);
    log::info!("Storage backend: {:?}", cli.storage);
    if cli.debug {
        log::debug!("Debug mode enabled");
    }

    run_server(cli.port, cli.storage, cli.data_dir).await
}
