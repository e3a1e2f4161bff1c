//! In-memory rate storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{PersistenceAdapter, PersistenceError};
use crate::domain::rate::{CurrencyRate, RateId, RateRecord};

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `create` calls.
    pub create: usize,
    /// `get_by_id` calls.
    pub get_by_id: usize,
    /// `get_by_pair` calls.
    pub get_by_pair: usize,
    /// `list` calls.
    pub list: usize,
    /// `update` calls.
    pub update: usize,
    /// `delete` calls.
    pub delete: usize,
    /// `close` calls.
    pub close: usize,
}

#[derive(Debug, Default)]
struct Counters {
    create: AtomicUsize,
    get_by_id: AtomicUsize,
    get_by_pair: AtomicUsize,
    list: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    close: AtomicUsize,
}

/// In-memory implementation of [`PersistenceAdapter`].
///
/// Suitable for testing and development. Records call counts and can be
/// told to fail every operation with a given error.
#[derive(Debug, Default)]
pub struct InMemoryRateAdapter {
    records: RwLock<BTreeMap<i64, RateRecord>>,
    next_id: AtomicI64,
    failure: RwLock<Option<PersistenceError>>,
    closed: AtomicBool,
    calls: Counters,
}

impl InMemoryRateAdapter {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `error`.
    pub fn fail_with(&self, error: PersistenceError) {
        *self.failure.write() = Some(error);
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        let c = &self.calls;
        CallCounts {
            create: c.create.load(Ordering::SeqCst),
            get_by_id: c.get_by_id.load(Ordering::SeqCst),
            get_by_pair: c.get_by_pair.load(Ordering::SeqCst),
            list: c.list.load(Ordering::SeqCst),
            update: c.update.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
            close: c.close.load(Ordering::SeqCst),
        }
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All stored rates in insertion order.
    #[must_use]
    pub fn rates(&self) -> Vec<CurrencyRate> {
        self.records
            .read()
            .values()
            .map(|record| record.rate.clone())
            .collect()
    }

    fn check(&self, counter: &AtomicUsize) -> Result<(), PersistenceError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(PersistenceError::Closed);
        }
        self.failure.read().clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryRateAdapter {
    async fn create(&self, rate: &CurrencyRate) -> Result<RateId, PersistenceError> {
        self.check(&self.calls.create)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .write()
            .insert(id, RateRecord::new(RateId::new(id), rate.clone()));
        Ok(RateId::new(id))
    }

    async fn get_by_id(&self, id: RateId) -> Result<Option<RateRecord>, PersistenceError> {
        self.check(&self.calls.get_by_id)?;
        Ok(self.records.read().get(&id.get()).cloned())
    }

    async fn get_by_pair(&self, pair: &str) -> Result<Option<RateRecord>, PersistenceError> {
        self.check(&self.calls.get_by_pair)?;
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| record.rate.pair() == pair)
            .max_by_key(|record| (record.rate.timestamp(), record.id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<RateRecord>, PersistenceError> {
        self.check(&self.calls.list)?;
        Ok(self.records.read().values().cloned().collect())
    }

    async fn update(&self, record: &RateRecord) -> Result<(), PersistenceError> {
        self.check(&self.calls.update)?;
        let mut records = self.records.write();
        match records.get_mut(&record.id.get()) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(PersistenceError::MissingRecord(record.id)),
        }
    }

    async fn delete(&self, id: RateId) -> Result<(), PersistenceError> {
        self.check(&self.calls.delete)?;
        self.records.write().remove(&id.get());
        Ok(())
    }

    async fn close(&self) {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}
