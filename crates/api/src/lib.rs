//! HTTP API server for the order management service.
//!
//! Provides REST endpoints for orders, products, and authentication,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use auth::{AuthService, TokenService};
use axum::Router;
use axum::routing::{delete, get, patch, post};
use domain::{OrderRepository, OrderService, ProductRepository, ProductService, UserRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Storage backend usable by the API.
pub trait Store: OrderRepository + ProductRepository + UserRepository + Clone + 'static {}

impl<T> Store for T where T: OrderRepository + ProductRepository + UserRepository + Clone + 'static {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub products: ProductService<S>,
    pub auth: AuthService<S>,
}

impl<S: Store> AppState<S> {
    /// Builds every service on top of one store.
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            products: ProductService::new(store.clone()),
            auth: AuthService::new(store, tokens),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/refresh", post(routes::auth::refresh::<S>))
        .route("/auth/reset-password", post(routes::auth::reset_password::<S>))
        .route(
            "/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/start", post(routes::orders::start::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/products", post(routes::orders::add_product::<S>))
        .route(
            "/orders/{id}/products/{product_id}",
            delete(routes::orders::remove_product::<S>),
        )
        .route("/orders/{id}/close", patch(routes::orders::close::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
