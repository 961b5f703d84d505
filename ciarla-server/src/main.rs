use anyhow::Context;
use ciarla_core::SystemClock;
use tracing::{info, warn};

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use ciarla_server::{bind, serve, telemetry, ServerConfig};

fn main() -> anyhow::Result<()> {
    // L'offset locale va letto finché il processo ha un solo thread,
    // quindi prima di costruire il runtime tokio.
    let clock = SystemClock::local();
    telemetry::init_tracing();

    let config = ServerConfig::from_env().context("load config from env")?;
    info!(offset = %clock.offset(), "using local clock");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(run(config, clock))
}

async fn run(config: ServerConfig, clock: SystemClock) -> anyhow::Result<()> {
    let listener = bind(&config).await?;
    serve(listener, &config, clock, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            // senza segnale il server gira finché il processo non viene ucciso
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
