use anyhow::Context;
use graft::{LabConfig, http, lab};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = LabConfig::load().context("loading lab config")?;
    let server = lab::build(&config).context("assembling lab server")?;

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(addr = %listener.local_addr()?, "graft lab listening");

    http::serve(server, listener, shutdown_signal()).await?;
    tracing::info!("graft lab stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
