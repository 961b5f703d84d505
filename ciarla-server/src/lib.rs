use anyhow::Context;
use ciarla_core::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::info;

pub mod config;
pub mod controllers;
pub mod error;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod telemetry;

pub use config::ServerConfig;
pub use relay::{RelayHandle, RelayStats};

/// Stato condiviso dagli handler axum. Niente sessioni qui: le possiede il relay.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayHandle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(relay: RelayHandle) -> Self {
        Self { relay, started_at: Instant::now() }
    }
}

/// Crea il listener TCP sull'indirizzo configurato.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = config.bind_addr();
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind tcp listener on {}", addr))
}

/// Avvia il relay e serve HTTP/WS su `listener` finché `shutdown` non completa.
pub async fn serve<C, F>(
    listener: TcpListener,
    config: &ServerConfig,
    clock: C,
    shutdown: F,
) -> anyhow::Result<()>
where
    C: Clock + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let (relay, _relay_task) = RelayHandle::spawn(clock);
    let app = routes::router(Arc::new(AppState::new(relay)), &config.public_dir);

    let addr = listener.local_addr().context("read listener address")?;
    info!(%addr, public_dir = %config.public_dir.display(), "server running");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("server shutdown")?;
    // le connessioni websocket ancora aperte tengono vivo il relay finché non chiudono
    Ok(())
}
