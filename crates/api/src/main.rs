use anyhow::Context;
use api::{AppConfig, AppState, router};
use backend::BackendClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    init_tracing(config.logging.json);

    let backend = BackendClient::new(&config.backend).context("Failed to build backend client")?;
    if backend.token().is_none() {
        tracing::warn!("No backend token configured; requests without a bearer token get 401");
    }

    let state = Arc::new(AppState::new(backend));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!(
        bind_addr = %config.server.bind_addr,
        backend = %config.backend.base_url,
        "Proxy listening"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
