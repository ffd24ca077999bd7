//! Liveness and store health endpoints.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::DocumentStore;

/// Response body for `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
}

/// Response body for `GET /db/health`.
///
/// The key is `mongo` so existing clients and health monitors keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    /// `"ok"` or `"down"`.
    pub mongo: String,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}

async fn db_health(
    State(store): State<Arc<dyn DocumentStore>>,
) -> (StatusCode, Json<StoreHealth>) {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StoreHealth {
                mongo: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "document store health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StoreHealth {
                    mongo: "down".to_string(),
                }),
            )
        }
    }
}

/// Creates the router for `/health` and `/db/health`.
pub fn create_health_router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/db/health", get(db_health))
        .with_state(store)
}
