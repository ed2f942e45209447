use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use painel::app::App;
use painel::cli::Cli;
use painel::config::PainelConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG tem precedência; logs vão para stderr para não misturar com as tabelas.
    let default_level = if cli.verbose { "painel=debug" } else { "painel=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = PainelConfig::load(cli.config.as_deref())?;
    tracing::debug!(base_url = %config.base_url, "configuration loaded");

    let mut app = App::new(config, cli.class_override)?;
    app.run(cli.command).await
}
