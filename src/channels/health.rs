//! Liveness probe for the hosting platform.
//!
//! Independent of tracking state: if the process can answer, it is alive.

use crate::config::HealthConfig;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

/// Routes served by the probe.
pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/ping", get(ping))
}

async fn home() -> &'static str {
    "🤖 Bot is up and running!"
}

async fn health() -> &'static str {
    "OK"
}

async fn ping() -> &'static str {
    "pong"
}

/// Bind `config.host:config.port` and serve until the task is dropped.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops with an error.
pub async fn serve(config: &HealthConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    serve_on(listener).await
}

/// Serve the probe on an already bound listener.
///
/// # Errors
///
/// Fails if the server stops with an error.
pub async fn serve_on(listener: TcpListener) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("health probe listening on http://{local_addr}");
    axum::serve(listener, router()).await?;
    Ok(())
}
