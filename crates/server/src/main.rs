use std::future::IntoFuture;

use stormwatch_server::app::Stormwatch;
use stormwatch_server::config;
use stormwatch_server::shutdown::wait_for_shutdown;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = config::load().inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))?;
    let app = Stormwatch::start(&config).inspect_err(|e| tracing::error!(error = %e, "startup failed"))?;

    let rest_addr = config.server.rest_addr;
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    tracing::info!(%rest_addr, "REST server starting");

    // alert streams never end on their own
    tokio::select! {
        r = axum::serve(listener, app.router()).into_future() => r?,
        _ = wait_for_shutdown() => {}
    }

    app.stop();
    Ok(())
}
