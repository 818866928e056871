//! # Ledger Store
//!
//! Persists a [`Ledger`] in an embedded sled database.
//!
//! ## Tree Layout
//!
//! | Tree     | Key               | Value                     |
//! |----------|-------------------|---------------------------|
//! | `ledger` | `pool` / `asset`  | JSON snapshot             |
//! | `events` | `seq` (8B BE)     | JSON `EventRecord`        |
//!
//! Sequence numbers are big-endian so sled's lexicographic order matches
//! log order. Snapshots are JSON rather than a binary codec because amounts
//! are `u128` and the event log must stay readable by external tools.
//!
//! ## Atomicity
//!
//! `save` writes both snapshots and every new event record in a single
//! multi-tree transaction, then flushes. A crash leaves either the previous
//! committed ledger or the new one on disk, never a mix.

use std::path::Path;

use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional, Tree};

use edupool_contracts::{EventRecord, LendingPool, StableCoin};

use crate::ledger::Ledger;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store is not initialized")]
    Empty,

    #[error("store already holds a ledger")]
    AlreadyInitialized,

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("transaction aborted")]
    Aborted,
}

pub type StoreResult<T> = Result<T, StoreError>;

const KEY_POOL: &[u8] = b"pool";
const KEY_ASSET: &[u8] = b"asset";

/// sled-backed persistence for one ledger.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    db: Db,
    ledger: Tree,
    events: Tree,
}

impl LedgerStore {
    /// Opens or creates a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway in-memory store for tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let ledger = db.open_tree("ledger")?;
        let events = db.open_tree("events")?;
        Ok(Self { db, ledger, events })
    }

    /// `true` if a ledger has been saved.
    pub fn is_initialized(&self) -> StoreResult<bool> {
        Ok(self.ledger.contains_key(KEY_POOL)?)
    }

    /// Saves a freshly created ledger. Fails if one already exists.
    pub fn create(&self, ledger: &Ledger) -> StoreResult<()> {
        if self.is_initialized()? {
            return Err(StoreError::AlreadyInitialized);
        }
        self.save(ledger)
    }

    /// Loads the saved ledger.
    pub fn load(&self) -> StoreResult<Ledger> {
        let pool_bytes = self.ledger.get(KEY_POOL)?.ok_or(StoreError::Empty)?;
        let asset_bytes = self
            .ledger
            .get(KEY_ASSET)?
            .ok_or_else(|| StoreError::Corrupt("pool snapshot without asset".into()))?;

        let pool: LendingPool = serde_json::from_slice(&pool_bytes)?;
        let asset: StableCoin = serde_json::from_slice(&asset_bytes)?;

        let persisted = self.events.len();
        if persisted != pool.events().len() {
            return Err(StoreError::Corrupt(format!(
                "event log has {} records, pool snapshot has {}",
                persisted,
                pool.events().len()
            )));
        }
        Ok(Ledger { pool, asset })
    }

    /// Writes both snapshots and appends any event records not yet stored.
    pub fn save(&self, ledger: &Ledger) -> StoreResult<()> {
        let pool_bytes = serde_json::to_vec(&ledger.pool)?;
        let asset_bytes = serde_json::to_vec(&ledger.asset)?;

        let stored = self.events.len() as u64;
        let new_events = ledger
            .pool
            .events_since(stored)
            .iter()
            .map(|record| -> StoreResult<_> {
                Ok((record.seq.to_be_bytes(), serde_json::to_vec(record)?))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        (&self.ledger, &self.events)
            .transaction(|(ledger_tree, events_tree)| -> ConflictableTransactionResult<(), ()> {
                ledger_tree.insert(KEY_POOL, pool_bytes.as_slice())?;
                ledger_tree.insert(KEY_ASSET, asset_bytes.as_slice())?;
                for (key, value) in &new_events {
                    events_tree.insert(&key[..], value.as_slice())?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Storage(e) => StoreError::Sled(e),
                TransactionError::Abort(()) => StoreError::Aborted,
            })?;

        self.db.flush()?;
        tracing::debug!(events = new_events.len(), "ledger saved");
        Ok(())
    }

    /// All stored event records, oldest first.
    pub fn events(&self) -> StoreResult<Vec<EventRecord>> {
        self.events
            .iter()
            .map(|entry| -> StoreResult<EventRecord> {
                let (_key, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}
