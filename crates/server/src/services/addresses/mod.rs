//! Address service.
//!
//! Resolves, merges and persists address records on top of an
//! [`AddressCollection`]. Every operation that may create a record takes the
//! [`Caller`], whose user ID and domain seed brand-new addresses.

mod error;

pub use error::AddressError;

use std::sync::Arc;

use tracing::instrument;

use addressbook_core::{Address, AddressId, AddressPatch, DomainCode, Page, UserId};

use crate::db::{AddressCollection, AddressFilter, RepositoryError};
use crate::models::CurrentUser;

/// The identity an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub domain: DomainCode,
}

impl Caller {
    #[must_use]
    pub const fn new(user_id: UserId, domain: DomainCode) -> Self {
        Self { user_id, domain }
    }
}

impl From<&CurrentUser> for Caller {
    fn from(user: &CurrentUser) -> Self {
        Self::new(user.id.clone(), user.domain.clone())
    }
}

/// A programmatic address write for a specific user.
#[derive(Debug, Clone)]
pub struct UserAddress {
    /// Owner of the address.
    pub id_user: UserId,
    /// Existing address to update; a new one is created when absent or unknown.
    pub id: Option<AddressId>,
    /// Field values to merge in.
    pub patch: AddressPatch,
    /// Replace every other address of the same type for this user.
    pub unique: bool,
}

impl UserAddress {
    /// A new, non-unique address for `id_user` with no fields set.
    #[must_use]
    pub fn new(id_user: UserId) -> Self {
        Self {
            id_user,
            id: None,
            patch: AddressPatch::default(),
            unique: false,
        }
    }
}

/// Address operations shared by the HTTP handlers and the CLI.
///
/// Cheap to clone; clones share the same collection.
#[derive(Clone)]
pub struct AddressService {
    collection: Arc<dyn AddressCollection>,
}

impl std::fmt::Debug for AddressService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressService").finish_non_exhaustive()
    }
}

impl AddressService {
    /// Create a service over `collection`.
    #[must_use]
    pub fn new(collection: Arc<dyn AddressCollection>) -> Self {
        Self { collection }
    }

    /// Create the collection and its indexes if needed.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the backend rejects the schema.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<(), AddressError> {
        self.collection.init().await?;
        Ok(())
    }

    /// Check that the storage backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the backend does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        self.collection.ping().await
    }

    /// Look up an address by ID.
    ///
    /// When nothing is found and `create_empty` is set, returns a fresh,
    /// unsaved record with a new ID owned by the caller in the caller's
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Option<&AddressId>,
        create_empty: bool,
    ) -> Result<Option<Address>, AddressError> {
        if let Some(id) = id {
            let found = self
                .collection
                .find_one(&AddressFilter::by_id(id.clone()))
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        Ok(create_empty.then(|| {
            Address::blank(
                AddressId::generate(),
                caller.domain.clone(),
                Some(caller.user_id.clone()),
            )
        }))
    }

    /// Merge `patch` into the address `id` and persist the result.
    ///
    /// Returns `None` when the base record cannot be resolved (no such `id`
    /// and `create_empty` unset).
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the lookup or write fails.
    #[instrument(skip(self, patch))]
    pub async fn merge(
        &self,
        caller: &Caller,
        id: Option<&AddressId>,
        patch: AddressPatch,
        create_empty: bool,
    ) -> Result<Option<Address>, AddressError> {
        let Some(base) = self.get(caller, id, create_empty).await? else {
            return Ok(None);
        };

        let stored = self.collection.upsert(&base.merged(patch)).await?;
        Ok(Some(stored))
    }

    /// Create a new address from `patch`.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the write fails.
    pub async fn add(&self, caller: &Caller, patch: AddressPatch) -> Result<Address, AddressError> {
        let address = self
            .merge(caller, None, patch, true)
            .await?
            .ok_or(AddressError::NotFound)?;

        tracing::info!(address_id = %address.id, domain = %address.domain, "Address created");
        Ok(address)
    }

    /// Apply `patch` to an existing address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if `id` does not exist; nothing is
    /// written in that case.
    pub async fn update(
        &self,
        caller: &Caller,
        id: &AddressId,
        patch: AddressPatch,
    ) -> Result<Address, AddressError> {
        let address = self
            .merge(caller, Some(id), patch, false)
            .await?
            .ok_or(AddressError::NotFound)?;

        tracing::info!(address_id = %address.id, "Address updated");
        Ok(address)
    }

    /// List addresses matching `filter`, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &AddressFilter,
        page: Page,
    ) -> Result<Vec<Address>, AddressError> {
        Ok(self.collection.find_all(filter, page).await?)
    }

    /// Delete an address. Deleting an unknown ID succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &AddressId) -> Result<AddressId, AddressError> {
        let removed = self.collection.delete(&AddressFilter::by_id(id.clone())).await?;
        tracing::info!(address_id = %id, removed, "Address deleted");
        Ok(id.clone())
    }

    /// Create or update an address owned by `address.id_user`.
    ///
    /// With `unique` set, every other address of the same user and type is
    /// removed first, so at most one remains.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Invalid` if `unique` is set without a type.
    /// Returns `AddressError::Repository` if a lookup or write fails.
    #[instrument(skip(self, address), fields(id_user = %address.id_user, unique = address.unique))]
    pub async fn add_for_user(
        &self,
        caller: &Caller,
        address: UserAddress,
    ) -> Result<Address, AddressError> {
        let UserAddress {
            id_user,
            id,
            mut patch,
            unique,
        } = address;
        patch.id_user = Some(id_user.clone());

        let base = self
            .get(caller, id.as_ref(), true)
            .await?
            .ok_or(AddressError::NotFound)?;
        let merged = base.merged(patch);

        if unique {
            let kind = merged
                .kind
                .clone()
                .ok_or_else(|| AddressError::Invalid("type is required for unique addresses".to_string()))?;
            let removed = self
                .collection
                .delete(&AddressFilter::by_user(id_user).with_kind(kind))
                .await?;
            tracing::debug!(removed, "Removed addresses of the same type");
        }

        Ok(self.collection.upsert(&merged).await?)
    }

    /// Every address of one user, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the query fails.
    pub async fn list_for_user(&self, id_user: &UserId) -> Result<Vec<Address>, AddressError> {
        self.list(&AddressFilter::by_user(id_user.clone()), Page::ALL)
            .await
    }

    /// One of the caller's own addresses.
    ///
    /// With `id`, the address must belong to the caller; without it, the
    /// caller's first address is returned.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if there is no such address.
    #[instrument(skip(self))]
    pub async fn details(
        &self,
        caller: &Caller,
        id: Option<&AddressId>,
    ) -> Result<Address, AddressError> {
        let mut filter = AddressFilter::by_user(caller.user_id.clone());
        filter.id = id.cloned();

        self.collection
            .find_one(&filter)
            .await?
            .ok_or(AddressError::NotFound)
    }

    /// The caller's own addresses, paginated.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the query fails.
    pub async fn list_own(&self, caller: &Caller, page: Page) -> Result<Vec<Address>, AddressError> {
        self.list(&AddressFilter::by_user(caller.user_id.clone()), page)
            .await
    }
}
