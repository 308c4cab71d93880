//! CLI subcommands.

pub mod address;
pub mod migrate;

use std::sync::Arc;

use thiserror::Error;

use addressbook_server::config::{ConfigError, database_url_from_env};
use addressbook_server::db::{PgAddresses, create_pool};
use addressbook_server::services::{AddressError, AddressService};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Address operation failed.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// Output could not be serialized.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Connect to the address database.
async fn connect() -> Result<PgAddresses, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;
    tracing::info!("Connecting to address database...");
    let pool = create_pool(&database_url).await?;
    Ok(PgAddresses::new(pool))
}

/// Connect and build an address service over the database.
async fn address_service() -> Result<AddressService, CommandError> {
    Ok(AddressService::new(Arc::new(connect().await?)))
}
