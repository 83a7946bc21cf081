//! Org tree HTTP server entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and migrate the store before the
//!   listener accepts connections.
//! - Stop gracefully on Ctrl-C.

use orgtree_api::{AppState, ServerConfig};
use std::error::Error;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;

    let log_dir = config
        .log_dir
        .as_ref()
        .map(|dir| dir.to_string_lossy().into_owned());
    orgtree_core::init_logging(&config.log_level, log_dir.as_deref())?;

    let state = match AppState::open(&config.db_path) {
        Ok(state) => state,
        Err(err) => {
            log::error!(
                "event=store_open module=cli status=error db_path={} error={err}",
                config.db_path.display()
            );
            return Err(err.into());
        }
    };

    let listener = TcpListener::bind(config.bind_addr()).await?;
    orgtree_api::serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("event=shutdown_signal module=cli status=error error={err}");
        std::future::pending::<()>().await;
    }
    log::info!("event=shutdown_signal module=cli status=ok");
}
