// src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

use employee_directory::cli::Cli;
use employee_directory::config::{AppConfig, LoggingConfig};

/// RUST_LOG важнее уровня из конфига
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    init_logging(&config.logging);

    cli.run(config).await
}
