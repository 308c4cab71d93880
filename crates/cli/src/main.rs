//! Address book CLI - database setup and address management.
//!
//! # Usage
//!
//! ```bash
//! # Create the addresses collection and the session table
//! addressbook migrate
//!
//! # Add an address for a user
//! addressbook address add --user u1 --domain acme --address "Via Roma" --nr 12 --type personal
//!
//! # List a user's addresses
//! addressbook address list --user u1
//!
//! # Delete an address
//! addressbook address delete --id addr-...
//! ```
//!
//! # Commands
//!
//! - `migrate` - Initialize the database
//! - `address add|list|delete` - Programmatic address management

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::address::AddArgs;

#[derive(Parser)]
#[command(name = "addressbook")]
#[command(author, version, about = "Address book CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the addresses collection, its indexes and the session table
    Migrate,
    /// Manage addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// Add or update an address for a user
    Add(AddArgs),
    /// List every address of a user
    List {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// Delete an address
    Delete {
        /// Address ID
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (stderr, so stdout stays pure JSON)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Address { action } => match action {
            AddressAction::Add(args) => commands::address::add(args).await?,
            AddressAction::List { user } => commands::address::list(&user).await?,
            AddressAction::Delete { id } => commands::address::delete(&id).await?,
        },
    }
    Ok(())
}
