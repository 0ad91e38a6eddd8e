//! Transaction identifiers.
//!
//! Every transaction gets an integer id that is unique within the process
//! and increases monotonically. Ids come from an [`IdSource`]; by default
//! all transactions share one process-wide counter, while tests can inject
//! their own [`Sequence`] to get deterministic numbering.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Produces unique transaction ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> TxId;
}

/// Monotonic counter.
#[derive(Debug)]
pub struct Sequence {
    next: AtomicU64,
}

impl Sequence {
    /// Creates a counter whose first id is `first`.
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl IdSource for Sequence {
    fn next_id(&self) -> TxId {
        TxId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

static PROCESS_IDS: Sequence = Sequence::starting_at(0);

/// The process-wide counter used by [`Transaction::new`](super::Transaction::new).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIds;

impl IdSource for ProcessIds {
    fn next_id(&self) -> TxId {
        PROCESS_IDS.next_id()
    }
}
