//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::AddressService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; built once at startup and read-only
/// afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    addresses: AddressService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(addresses: AddressService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { addresses }),
        }
    }

    /// Get a reference to the address service.
    #[must_use]
    pub fn addresses(&self) -> &AddressService {
        &self.inner.addresses
    }
}
