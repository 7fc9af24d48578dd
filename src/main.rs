//! FlickTile - gesture-driven window snapping for macOS

use clap::Parser;
use flicktile::{
    app::{FlickTile, Providers},
    cli::{CliExecutor, FlickTileCli},
    config::{ProfileStore, Settings},
    logging::{init_logging, LogConfig},
    FlickTileError, Result,
};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = FlickTileCli::parse();

    let log_config = if cli.verbose {
        LogConfig::development().with_env_overrides()
    } else {
        LogConfig::from_env()
    };
    init_logging(&log_config)
        .map_err(|e| FlickTileError::ConfigurationError(format!("Failed to initialize logging: {}", e)))?;

    info!("FlickTile v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(cli.config.as_deref())?;
    let store = ProfileStore::load(ProfileStore::default_path());
    let app = FlickTile::new(settings, Providers::system(), store)?;

    let mut executor = CliExecutor::new(app);
    if let Err(e) = executor.execute(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
