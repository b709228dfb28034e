//! Watch the vault and rebuild the graph whenever notes change.

use clap::Parser;
use notegraph::watch::run_watcher;
use notegraph::Config;
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(about = "Watch the vault for changes and rebuild the link graph")]
struct Args {
    /// Quiet period in milliseconds before a batch of changes triggers a rebuild
    #[arg(long, default_value = "500")]
    debounce_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args = Args::parse();

    log::info!("Starting notegraph watcher");
    let config = Config::load()?;
    log::info!("Vault root: {}", config.vault_root().display());
    log::info!("Debounce: {} ms", args.debounce_ms);

    log::info!("Watching for changes (Ctrl+C to stop)");
    run_watcher(config, args.debounce_ms, |stats| {
        log::info!("graph refreshed: {}", stats);
    })
    .await?;
    Ok(())
}
