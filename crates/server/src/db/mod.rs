//! Storage for the `addresses` collection.
//!
//! # Collection: `addresses`
//!
//! One record per address, keyed by a unique `id`. Secondary indexes on
//! `domain`, `id_user`, `type`, `zip`, `city`, `state` and `country`.
//!
//! # Backends
//!
//! - [`PgAddresses`] - `PostgreSQL` table, one column per address field
//! - [`InMemoryAddresses`] - process-local, for development and tests
//!
//! Both return records in insertion order so paginated listings are stable.
//!
//! # Initialization
//!
//! [`AddressCollection::init`] creates the collection and its indexes. It is
//! idempotent and never drops data, so it runs on every startup and from:
//! ```bash
//! cargo run -p addressbook-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use addressbook_core::{Address, AddressId, DomainCode, Page, UserId};

pub use memory::InMemoryAddresses;
pub use postgres::PgAddresses;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Equality filter over the indexed address fields.
///
/// Unset fields impose no constraint, so the default filter matches every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub id: Option<AddressId>,
    pub domain: Option<DomainCode>,
    pub id_user: Option<UserId>,
    pub kind: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl AddressFilter {
    /// Match the single record with this ID.
    #[must_use]
    pub fn by_id(id: AddressId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Match every record owned by this user.
    #[must_use]
    pub fn by_user(id_user: UserId) -> Self {
        Self {
            id_user: Some(id_user),
            ..Self::default()
        }
    }

    /// Narrow the filter to one address type.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// The constrained `(column, value)` pairs of this filter.
    ///
    /// Column names are the storage names (`type` rather than `kind`).
    #[must_use]
    pub fn clauses(&self) -> Vec<(&'static str, &str)> {
        [
            ("id", self.id.as_ref().map(AddressId::as_str)),
            ("domain", self.domain.as_ref().map(DomainCode::as_str)),
            ("id_user", self.id_user.as_ref().map(UserId::as_str)),
            ("type", self.kind.as_deref()),
            ("zip", self.zip.as_deref()),
            ("city", self.city.as_deref()),
            ("state", self.state.as_deref()),
            ("country", self.country.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    /// Whether `address` satisfies every constraint of this filter.
    #[must_use]
    pub fn matches(&self, address: &Address) -> bool {
        self.clauses().into_iter().all(|(column, value)| {
            let field = match column {
                "id" => Some(address.id.as_str()),
                "domain" => Some(address.domain.as_str()),
                "id_user" => address.id_user.as_ref().map(UserId::as_str),
                "type" => address.kind.as_deref(),
                "zip" => address.zip.as_deref(),
                "city" => address.city.as_deref(),
                "state" => address.state.as_deref(),
                "country" => address.country.as_deref(),
                _ => None,
            };
            field == Some(value)
        })
    }
}

/// A document-style collection of addresses.
///
/// Implementations only persist and query; merge rules, ID generation and
/// permission checks live in the address service.
#[async_trait]
pub trait AddressCollection: Send + Sync {
    /// Create the collection and its indexes if they do not exist yet.
    async fn init(&self) -> Result<(), RepositoryError>;

    /// Return the first record matching `filter`, if any.
    async fn find_one(&self, filter: &AddressFilter) -> Result<Option<Address>, RepositoryError>;

    /// Return the records matching `filter` in insertion order, windowed by `page`.
    async fn find_all(
        &self,
        filter: &AddressFilter,
        page: Page,
    ) -> Result<Vec<Address>, RepositoryError>;

    /// Delete every record matching `filter`, returning how many were removed.
    async fn delete(&self, filter: &AddressFilter) -> Result<u64, RepositoryError>;

    /// Insert `address`, or replace the stored record with the same `id`.
    ///
    /// A replaced record keeps its original position in insertion order.
    async fn upsert(&self, address: &Address) -> Result<Address, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
