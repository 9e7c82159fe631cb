//! Device Enrolment Service
//!
//! Local broker endpoint that lets new piste hardware join the venue trust
//! domain. Enrolment is gated by a time-boxed pairing window; an authorized
//! CSR is staged, signed by a privileged external helper and the resulting
//! certificate is stored per device and returned to the caller.

pub mod config;
pub mod handlers;
pub mod models;
pub mod pairing;
pub mod service;
pub mod signer;
pub mod staging;
pub mod store;
pub mod validate;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::AppState;
pub use models::{EnrolRequest, EnrolResponse, IssuedCertificate, PairingResponse};
pub use service::EnrolmentService;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/pairing/enable", post(handlers::enable_pairing_handler))
        .route("/api/pairing/disable", post(handlers::disable_pairing_handler))
        .route("/api/pairing", get(handlers::pairing_status_handler))
        .route("/api/enrol", post(handlers::enrol_handler))
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
