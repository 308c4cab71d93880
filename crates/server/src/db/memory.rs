//! In-memory address collection.
//!
//! Keeps records in a `Vec` behind an async `RwLock`, in insertion order.
//! Used by the `memory` storage backend and by tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use addressbook_core::{Address, Page};

use super::{AddressCollection, AddressFilter, RepositoryError};

/// Thread-safe in-memory collection. Cloning shares the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddresses {
    records: Arc<RwLock<Vec<Address>>>,
}

impl InMemoryAddresses {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the collection holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AddressCollection for InMemoryAddresses {
    async fn init(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn find_one(&self, filter: &AddressFilter) -> Result<Option<Address>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|a| filter.matches(a)).cloned())
    }

    async fn find_all(
        &self,
        filter: &AddressFilter,
        page: Page,
    ) -> Result<Vec<Address>, RepositoryError> {
        let records = self.records.read().await;
        Ok(page
            .window(records.iter().filter(|a| filter.matches(a)))
            .cloned()
            .collect())
    }

    async fn delete(&self, filter: &AddressFilter) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|a| !filter.matches(a));
        Ok((before - records.len()) as u64)
    }

    async fn upsert(&self, address: &Address) -> Result<Address, RepositoryError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|a| a.id == address.id) {
            Some(existing) => existing.clone_from(address),
            None => records.push(address.clone()),
        }
        Ok(address.clone())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
