//! HTTP boundary for the org tree service.
//!
//! # Responsibility
//! - Route JSON requests to the hierarchy and employee services.
//! - Own server configuration, request logging and graceful shutdown.
//!
//! # Invariants
//! - Engine errors reach clients only through [`ApiError`].

pub mod config;
pub mod error;
pub mod request_log;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::{router, AppState};

use std::future::Future;
use tokio::net::TcpListener;

/// Serves the application on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    log::info!(
        "event=server_start module=api status=ok addr={local_addr} db_path={} core_version={}",
        state.db_path().display(),
        orgtree_core::core_version()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("event=server_stop module=api status=ok addr={local_addr}");
    Ok(())
}
