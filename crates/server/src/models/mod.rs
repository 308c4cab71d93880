//! Domain models for the address service.
//!
//! Address records themselves live in `addressbook-core`; this module holds
//! the server-side session types.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
