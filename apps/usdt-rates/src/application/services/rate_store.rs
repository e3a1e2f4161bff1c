//! Rate Store
//!
//! Thin wrapper over a [`PersistenceAdapter`] that tags every failure with
//! the operation that produced it.

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{PersistenceAdapter, PersistenceError};
use crate::domain::rate::{CurrencyRate, RateId, RateRecord};

/// Errors from [`RateStore`]. The adapter error is kept as the source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert failed.
    #[error("failed to create rate record: {0}")]
    Create(#[source] PersistenceError),

    /// Update failed.
    #[error("failed to update rate record: {0}")]
    Update(#[source] PersistenceError),

    /// Delete failed.
    #[error("failed to delete rate record: {0}")]
    Delete(#[source] PersistenceError),

    /// Lookup by identifier failed.
    #[error("failed to fetch rate record by id: {0}")]
    GetById(#[source] PersistenceError),

    /// Lookup by pair failed.
    #[error("failed to fetch rate record by pair: {0}")]
    GetByPair(#[source] PersistenceError),

    /// Listing failed.
    #[error("failed to list rate records: {0}")]
    List(#[source] PersistenceError),
}

impl StoreError {
    /// The adapter error that caused this failure.
    #[must_use]
    pub const fn cause(&self) -> &PersistenceError {
        match self {
            Self::Create(e)
            | Self::Update(e)
            | Self::Delete(e)
            | Self::GetById(e)
            | Self::GetByPair(e)
            | Self::List(e) => e,
        }
    }
}

/// Storage facade used by the orchestrator.
#[derive(Clone)]
pub struct RateStore {
    adapter: Arc<dyn PersistenceAdapter>,
}

impl std::fmt::Debug for RateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateStore").finish_non_exhaustive()
    }
}

impl RateStore {
    /// Wrap an adapter.
    #[must_use]
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self { adapter }
    }

    /// Insert a new rate.
    pub async fn create(&self, rate: &CurrencyRate) -> Result<RateId, StoreError> {
        self.adapter.create(rate).await.map_err(StoreError::Create)
    }

    /// Overwrite an existing record.
    pub async fn update(&self, record: &RateRecord) -> Result<(), StoreError> {
        self.adapter.update(record).await.map_err(StoreError::Update)
    }

    /// Delete a record by identifier.
    pub async fn delete(&self, id: RateId) -> Result<(), StoreError> {
        self.adapter.delete(id).await.map_err(StoreError::Delete)
    }

    /// Fetch a record by identifier.
    ///
    /// A missing record yields [`RateRecord::default`], not an error.
    pub async fn get_by_id(&self, id: RateId) -> Result<RateRecord, StoreError> {
        self.adapter
            .get_by_id(id)
            .await
            .map(Option::unwrap_or_default)
            .map_err(StoreError::GetById)
    }

    /// Fetch the most recent record for a pair.
    ///
    /// A missing record yields [`RateRecord::default`], not an error.
    pub async fn get_by_pair(&self, pair: &str) -> Result<RateRecord, StoreError> {
        self.adapter
            .get_by_pair(pair)
            .await
            .map(Option::unwrap_or_default)
            .map_err(StoreError::GetByPair)
    }

    /// List every stored record.
    pub async fn list(&self) -> Result<Vec<RateRecord>, StoreError> {
        self.adapter.list().await.map_err(StoreError::List)
    }

    /// Release the adapter's connection.
    pub async fn close(&self) {
        self.adapter.close().await;
    }
}
