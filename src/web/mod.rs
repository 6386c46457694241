mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use state::AppState;

use crate::services::accounts;
use crate::{Config, Database};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// The full application router with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .merge(routes::public_routes())
        .merge(routes::auth_routes())
        .merge(routes::account_routes())
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db.clone())?);

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match accounts::cleanup_expired_sessions(&db) {
                Ok(0) => {}
                Ok(n) => tracing::info!("Removed {} expired sessions", n),
                Err(e) => tracing::error!("Session cleanup failed: {}", e),
            }
            limiter.cleanup();
        }
    });

    if state.summarizer.is_enabled() {
        tracing::info!("Summarizer enabled: {}", state.summarizer.endpoint());
    } else {
        tracing::info!("Summarizer disabled; posts fall back to extractive summaries");
    }

    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
