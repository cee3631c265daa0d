use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::analytics::identity::USER_ID_HEADER;
use crate::Beacon;

use super::handlers::{
    add_like, get_likes, get_ratings, get_stats, health_check, record_ping, remove_like,
    submit_rating, AppState,
};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

pub fn create_api_router(beacon: Arc<Beacon>) -> Router {
    let state = Arc::new(AppState { beacon });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/stats", get(get_stats).post(record_ping))
        .route("/api/ratings", get(get_ratings).post(submit_rating))
        .route(
            "/api/likes",
            get(get_likes).post(add_like).delete(remove_like),
        )
        .layer(cors_layer())
        .with_state(state)
}
