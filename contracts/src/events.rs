//! # Pool Notifications
//!
//! Every committed pool operation appends exactly one [`PoolEvent`] to the
//! pool's [`EventLog`]. Failed operations append nothing. The log is the
//! audit trail that indexers and UIs scan; records are never edited or
//! removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount};

/// A state change observed on the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEvent {
    /// The pool was configured.
    Initialized {
        /// Address the pool holds funds under.
        pool: Address,
        /// Configured pool name.
        pool_name: String,
        /// The pool's only borrower.
        borrower: Address,
    },
    /// The borrower switched the pool from Pending to Active.
    Active {
        /// Address of the activated pool.
        pool: Address,
    },
    /// A provider deposited liquidity.
    Provided {
        /// Name of the receiving pool.
        pool_name: String,
        /// Depositing account.
        provider: Address,
        /// Amount deposited, in base units.
        amount: Amount,
    },
    /// A provider took liquidity back.
    Withdrawn {
        /// Name of the pool paying out.
        pool_name: String,
        /// Withdrawing account.
        provider: Address,
        /// Amount withdrawn, in base units.
        amount: Amount,
    },
    /// The borrower drew funds.
    Borrowed {
        /// Name of the lending pool.
        pool_name: String,
        /// The borrower.
        borrower: Address,
        /// Principal drawn, in base units.
        amount: Amount,
    },
    /// The borrower repaid principal plus interest.
    Paid {
        /// Name of the lending pool.
        pool_name: String,
        /// The borrower.
        borrower: Address,
        /// Principal repaid, in base units.
        amount: Amount,
        /// Interest charged on top of `amount`.
        interest: Amount,
    },
}

impl PoolEvent {
    /// Short snake_case name, matching the serialized variant key.
    pub fn kind(&self) -> &'static str {
        match self {
            PoolEvent::Initialized { .. } => "initialized",
            PoolEvent::Active { .. } => "active",
            PoolEvent::Provided { .. } => "provided",
            PoolEvent::Withdrawn { .. } => "withdrawn",
            PoolEvent::Borrowed { .. } => "borrowed",
            PoolEvent::Paid { .. } => "paid",
        }
    }
}

/// A logged event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based position in the log. Strictly increasing, gap-free.
    pub seq: u64,
    /// Wall-clock time the operation committed.
    pub emitted_at: DateTime<Utc>,
    /// The event itself.
    pub event: PoolEvent,
}

/// Append-only list of [`EventRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` and returns the stored record.
    pub fn emit(&mut self, event: PoolEvent) -> &EventRecord {
        let seq = self.records.len() as u64;
        self.records.push(EventRecord {
            seq,
            emitted_at: Utc::now(),
            event,
        });
        &self.records[self.records.len() - 1]
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= from`, for incremental scans.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }
}
