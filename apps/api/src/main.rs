mod analysis;
mod batch;
mod config;
mod errors;
mod llm_client;
mod pdf;
mod reconcile;
mod recovery;
mod report;
mod routes;
mod schema;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::Analyzer;
use crate::config::Config;
use crate::llm_client::gateway::{Gateway, RetryPolicy};
use crate::llm_client::OllamaClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sieve API v{}", env!("CARGO_PKG_VERSION"));

    let transport = OllamaClient::new(&config);
    let gateway = Gateway::new(Arc::new(transport), RetryPolicy::from_config(&config));
    info!(
        "Generation gateway initialized (endpoint: {}, model: {})",
        config.llm_url, config.llm_model
    );

    let analyzer = Arc::new(Analyzer::new(gateway));

    let state = AppState {
        analyzer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
