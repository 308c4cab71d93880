//! Session-related types.
//!
//! Types stored in the session for authentication state. Sessions are
//! written by the platform's login service, which shares the session store.

use serde::{Deserialize, Serialize};

use addressbook_core::{DomainCode, UserId};

/// Session-stored caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID.
    pub id: UserId,
    /// Domain the user is logged into.
    pub domain: DomainCode,
    /// Granted permission names, e.g. `address.add`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CurrentUser {
    /// Whether the user holds `permission` (exact match).
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
