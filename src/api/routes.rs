use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/content",
            post(handlers::create_content).get(handlers::list_content),
        )
        .route(
            "/content/:id",
            put(handlers::update_content).delete(handlers::delete_content),
        )
        .route("/search", post(handlers::search_content))
        .route("/categories", get(handlers::categories))
        .route("/tags", get(handlers::tags));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
