//! Address management commands.
//!
//! # Usage
//!
//! ```bash
//! # Add (or replace, with --unique) an invoice address for a user
//! addressbook address add --user u1 --domain acme --address "Via Roma" --nr 12 \
//!     --type invoice --company-name "ACME srl" --unique
//!
//! # List a user's addresses
//! addressbook address list --user u1
//!
//! # Delete an address
//! addressbook address delete --id addr-1f2e...
//! ```
//!
//! Results are printed to stdout as JSON.

use clap::Args;

use addressbook_core::{AddressId, AddressPatch, DomainCode, UserId};
use addressbook_server::services::{Caller, UserAddress};

use super::{CommandError, address_service};

/// Fields for `address add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Owning user ID
    #[arg(long)]
    pub user: String,

    /// Domain code for newly created addresses
    #[arg(long)]
    pub domain: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    /// Street number
    #[arg(long)]
    pub nr: String,

    /// Address type (`personal`, `company`, `invoice`)
    #[arg(long = "type")]
    pub kind: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub zip: Option<String>,

    /// State or province
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub company_name: Option<String>,

    #[arg(long)]
    pub fiscal_code: Option<String>,

    #[arg(long)]
    pub vat_number: Option<String>,

    /// SDI recipient code
    #[arg(long)]
    pub sdi: Option<String>,

    /// Certified e-mail (PEC)
    #[arg(long)]
    pub pec: Option<String>,

    /// Update this address instead of creating a new one
    #[arg(long)]
    pub id: Option<String>,

    /// Remove the user's other addresses of the same type
    #[arg(long)]
    pub unique: bool,
}

impl AddArgs {
    fn into_parts(self) -> (Caller, UserAddress) {
        let id_user = UserId::new(self.user);
        let caller = Caller::new(id_user.clone(), DomainCode::new(self.domain));
        let patch = AddressPatch {
            kind: self.kind,
            name: self.name,
            address: Some(self.address),
            nr: Some(self.nr),
            zip: self.zip,
            city: self.city,
            state: self.state,
            country: self.country,
            company_name: self.company_name,
            fiscal_code: self.fiscal_code,
            vat_number: self.vat_number,
            sdi: self.sdi,
            pec: self.pec,
            ..AddressPatch::default()
        };

        let request = UserAddress {
            id: self.id.map(AddressId::new),
            patch,
            unique: self.unique,
            ..UserAddress::new(id_user)
        };
        (caller, request)
    }
}

/// Create or update an address for a user and print it.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the write fails.
pub async fn add(args: AddArgs) -> Result<(), CommandError> {
    let service = address_service().await?;
    let (caller, request) = args.into_parts();

    let address = service.add_for_user(&caller, request).await?;
    tracing::info!(address_id = %address.id, "Address saved");

    print_json(&address)
}

/// Print every address of a user.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the query fails.
pub async fn list(user: &str) -> Result<(), CommandError> {
    let service = address_service().await?;
    let addresses = service.list_for_user(&UserId::new(user)).await?;
    tracing::info!(count = addresses.len(), "Addresses found");

    print_json(&addresses)
}

/// Delete an address by ID.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the delete fails.
pub async fn delete(id: &str) -> Result<(), CommandError> {
    let service = address_service().await?;
    let id = service.delete(&AddressId::new(id)).await?;

    print_json(&serde_json::json!({ "id": id }))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CommandError> {
    let output = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AddArgs,
    }

    #[test]
    fn test_add_args_build_user_address() {
        let Harness { args } = Harness::parse_from([
            "addressbook",
            "--user",
            "u1",
            "--domain",
            "acme",
            "--address",
            "Via Roma",
            "--nr",
            "12",
            "--type",
            "invoice",
            "--sdi",
            "ABC1234",
            "--unique",
        ]);

        let (caller, request) = args.into_parts();
        assert_eq!(caller.user_id, UserId::new("u1"));
        assert_eq!(caller.domain, DomainCode::new("acme"));
        assert_eq!(request.id_user, UserId::new("u1"));
        assert!(request.unique);
        assert!(request.id.is_none());
        assert_eq!(request.patch.kind.as_deref(), Some("invoice"));
        assert_eq!(request.patch.address.as_deref(), Some("Via Roma"));
        assert_eq!(request.patch.sdi.as_deref(), Some("ABC1234"));
    }
}
