//! # Sales API
//!
//! HTTP front of the prediction service. The router is built here so that it
//! can be exercised without binding a socket.

use axum::{
    routing::{get, post},
    Router,
};
use sales_forecast::PredictionService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

/// Router with the prediction and health endpoints
pub fn app(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}
