//! HTTP middleware stack for the address service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (reuse or mint `x-request-id`)
//! 4. Session layer (tower-sessions, shared with the login service)
//!
//! Authentication is per handler, through the extractors in [`auth`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AddressAdmin, Permission, RequireAuth, RequirePermission, set_current_user,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
