use super::{handlers, identity::assign_user_id, state::AppState};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let static_dir = ServeDir::new(&app_state.config.static_dir);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/categories", get(handlers::categories_handler))
        .route(
            "/api/spots",
            get(handlers::list_spots_handler)
                .post(handlers::create_spot_handler)
                .delete(handlers::delete_all_spots_handler),
        )
        .route("/api/spots/nearby", get(handlers::nearby_spots_handler))
        .route("/api/spots/import", post(handlers::import_spots_handler))
        .route("/api/spots/{id}", delete(handlers::delete_spot_handler))
        .route("/api/recommend", post(handlers::recommend_handler))
        .route("/api/route", post(handlers::route_handler))
        .route("/api/feedback", post(handlers::feedback_handler))
        .route("/api/accept", post(handlers::accept_handler))
        .route("/api/history", get(handlers::history_handler))
        .route("/api/routes/history", get(handlers::route_history_handler))
        .route(
            "/api/favorites",
            get(handlers::list_favorites_handler).post(handlers::add_favorite_handler),
        )
        .route(
            "/api/favorites/{spot_id}",
            delete(handlers::remove_favorite_handler),
        )
        .route(
            "/api/preferences",
            get(handlers::get_preferences_handler).put(handlers::put_preferences_handler),
        )
        .nest_service("/static", static_dir)
        .with_state(app_state)
        .layer(middleware::from_fn(assign_user_id))
        .layer(TraceLayer::new_for_http())
}
