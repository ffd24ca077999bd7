use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{DocumentStore, create_cuisine_router, create_health_router, create_recipe_router};

/// Assembles the full application: recipes, cuisines and health checks over one store,
/// with a tracing span per request.
pub fn create_router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .merge(create_recipe_router(Arc::clone(&store)))
        .merge(create_cuisine_router(Arc::clone(&store)))
        .merge(create_health_router(store))
        .layer(TraceLayer::new_for_http())
}
