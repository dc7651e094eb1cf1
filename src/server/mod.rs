use axum::{
    Router,
    routing::{get, post},
};
use crate::config::CatalogConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub mod routes;

/// Server state
pub struct AppState {
    pub database_path: PathBuf,
    pub config: CatalogConfig,
}

impl AppState {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            database_path: config.database.clone(),
            config,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/stats", get(routes::stats))
        .route("/query", get(routes::query))
        .route("/build", post(routes::build))
        .with_state(state)
}

pub async fn start_server(port: u16, config: CatalogConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
