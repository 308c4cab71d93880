//! HTTP route handlers for the address service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (pings storage)
//!
//! # Admin (permission `address.add`)
//! POST   /address/admin/add    - Create an address
//! PATCH  /address/admin/update - Merge fields into an address
//! PATCH  /address/admin/fields - Merge a field map into an address
//! GET    /address/admin/list   - List addresses (optionally by user)
//! DELETE /address/admin/del    - Delete an address
//!
//! # Self-service (any logged-in caller)
//! GET    /address/details      - One of the caller's addresses
//! GET    /address/list         - The caller's addresses
//! ```

pub mod address;
pub mod fields;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/add", post(address::admin_add))
        .route("/admin/update", patch(address::admin_update))
        .route("/admin/fields", patch(address::admin_fields))
        .route("/admin/list", get(address::admin_list))
        .route("/admin/del", delete(address::admin_delete))
        .route("/details", get(address::details))
        .route("/list", get(address::list))
}

/// Create all routes for the service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/address", address_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if storage is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.addresses().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
