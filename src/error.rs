//! Error types for fstx.
//!
//! Registration returns `Result<T>`, which aliases `Result<T, TxError>`.
//! The `Display` form of a `TxError` is the message recorded in the
//! transaction's error log.

use crate::fs::TxId;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from entity registration and the command line front end.
#[derive(Debug, Error)]
pub enum TxError {
    /// Directories are never snapshotted.
    #[error("cannot add existing directory \"{}\" to transaction", .0.display())]
    ExistingDirectory(PathBuf),

    /// Path is absent and the caller did not opt in to missing entities.
    #[error(
        "error adding non existent entity \"{}\": must allow nonexistent entities explicitly",
        .0.display()
    )]
    MissingEntity(PathBuf),

    /// Device, socket, fifo or anything else that is not a file, symlink
    /// or directory.
    #[error("cannot add \"{}\" to transaction: unsupported entity kind", .0.display())]
    UnsupportedKind(PathBuf),

    /// Probing the path failed for a reason other than absence.
    #[error("error probing \"{}\": {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the pre-image failed.
    #[error("error adding {kind} \"{}\", failed to read: {source}", .path.display())]
    Capture {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A transaction did not commit.
    #[error("Transaction {0} was rolled back")]
    RolledBack(TxId),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for fstx operations.
pub type Result<T> = std::result::Result<T, TxError>;
