//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! addressbook migrate
//! ```
//!
//! Creates the `addresses` table with its indexes and the session table
//! used by tower-sessions. Safe to run repeatedly; nothing is dropped.
//!
//! # Environment Variables
//!
//! - `ADDRESS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use tower_sessions_sqlx_store::PostgresStore;

use addressbook_server::db::AddressCollection;

use super::{CommandError, connect};

/// Initialize the address collection and the session store.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a statement fails.
pub async fn run() -> Result<(), CommandError> {
    let addresses = connect().await?;

    tracing::info!("Initializing addresses collection...");
    addresses
        .init()
        .await
        .map_err(|e| CommandError::Address(e.into()))?;

    tracing::info!("Initializing session store...");
    PostgresStore::new(addresses.pool().clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
