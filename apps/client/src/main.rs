use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coverletter_client::cli::{run, Cli};
use coverletter_client::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // --help and usage errors must not depend on a valid environment
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries the rendered page
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "coverletter_client={0},coverletter={0}",
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cover letter client v{}", env!("CARGO_PKG_VERSION"));

    run(cli, config).await
}
