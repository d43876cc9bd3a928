//! HBnB API server
//!
//! RESTful CRUD over States, Cities, Amenities, Users, Places and Reviews,
//! backed by a JSON file store or SQLite.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod session;
pub mod storage;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use hbnb_core::Storage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    /// Held by one request at a time; see [`session::request_session`]
    pub session_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            session_gate: Arc::new(Mutex::new(())),
        }
    }
}

/// Router for every API route, without trailing-slash handling
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .fallback(handlers::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The full service: [`build_router`] answering with or without a
/// trailing slash
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::index::status))
        .route("/stats", get(handlers::index::stats))
        // States and their cities
        .route(
            "/states",
            get(handlers::states::list).post(handlers::states::create),
        )
        .route(
            "/states/:id",
            get(handlers::states::show)
                .put(handlers::states::update)
                .delete(handlers::states::destroy),
        )
        .route(
            "/states/:id/cities",
            get(handlers::cities::list).post(handlers::cities::create),
        )
        .route(
            "/cities/:id",
            get(handlers::cities::show)
                .put(handlers::cities::update)
                .delete(handlers::cities::destroy),
        )
        // Amenities
        .route(
            "/amenities",
            get(handlers::amenities::list).post(handlers::amenities::create),
        )
        .route(
            "/amenities/:id",
            get(handlers::amenities::show)
                .put(handlers::amenities::update)
                .delete(handlers::amenities::destroy),
        )
        // Users
        .route(
            "/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/users/:id",
            get(handlers::users::show)
                .put(handlers::users::update)
                .delete(handlers::users::destroy),
        )
        // Places, their reviews and amenities
        .route(
            "/cities/:id/places",
            get(handlers::places::list).post(handlers::places::create),
        )
        .route(
            "/places/:id",
            get(handlers::places::show)
                .put(handlers::places::update)
                .delete(handlers::places::destroy),
        )
        .route(
            "/places/:id/reviews",
            get(handlers::reviews::list).post(handlers::reviews::create),
        )
        .route(
            "/reviews/:id",
            get(handlers::reviews::show)
                .put(handlers::reviews::update)
                .delete(handlers::reviews::destroy),
        )
        .route(
            "/places/:id/amenities",
            get(handlers::place_amenities::list),
        )
        .route(
            "/places/:id/amenities/:amenity_id",
            post(handlers::place_amenities::link).delete(handlers::place_amenities::unlink),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            session::request_session,
        ))
}
