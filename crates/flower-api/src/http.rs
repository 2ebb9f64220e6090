use axum::{
    Router,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
};
use flower_prometheus::{SeriesRegistry, TEXT_FORMAT};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::ApiError;

/// HTTP API service builder.
pub struct HttpApi {
    registry: SeriesRegistry,
}

impl HttpApi {
    pub fn new(registry: SeriesRegistry) -> Self {
        Self { registry }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /metrics - Prometheus text exposition of every registered gauge
    /// - GET /health - Liveness probe
    pub fn router(self) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .route("/health", get(health))
            .with_state(self.registry)
    }
}

/// Serve `router` on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), ApiError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!(%addr, "serving metrics");

    axum::serve(listener, router)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// GET /metrics
async fn metrics(State(registry): State<SeriesRegistry>) -> Result<impl IntoResponse, ApiError> {
    let body = registry.encode_text()?;
    debug!(bytes = body.len(), "scrape served");
    Ok(([(CONTENT_TYPE, TEXT_FORMAT)], body))
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}
