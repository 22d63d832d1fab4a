use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use order_desk::config::DeskConfig;
use order_desk::events::TracingSink;
use order_desk::{diagnostics, init_logging, OrderDesk};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DeskConfig::load(config_path.as_deref()).context("loading configuration")?;

    let _log_guard = init_logging(&config.log).context("initialising logging")?;
    info!(about = %diagnostics::get_about_info(), "Starting Order Desk v{}", env!("CARGO_PKG_VERSION"));

    let desk = OrderDesk::connect(config, Arc::new(TracingSink), None)
        .context("building HTTP client")?;
    desk.start();

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("Ctrl-C received, shutting down");
    desk.shutdown().await;
    Ok(())
}
