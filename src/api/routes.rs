use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/version", get(handlers::version_info))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Behavior tracking
        .route("/behavior/track", post(handlers::track_behavior))
        // Recommendations
        .route("/recommendations/personal", get(handlers::personal_recommendations))
        .route("/recommendations/popular", get(handlers::popular_books))
        .route("/recommendations/similar", get(handlers::similar_books))
        .route("/recommendations/categories", get(handlers::category_recommendations))
}
