//! File system transactions.
//!
//! Captures registered paths up front and restores them if the unit of
//! work does not end in success.

pub mod entity;
pub mod id;
mod ops;
pub mod transaction;

pub use entity::{Entity, EntityState};
pub use id::{IdSource, ProcessIds, Sequence, TxId};
pub use transaction::{MAX_MESSAGE_LEN, Outcome, RollbackResult, Transaction};
