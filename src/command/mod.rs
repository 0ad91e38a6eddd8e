//! Example transactions runnable from the command line.

pub mod hello;
pub mod nested;
pub mod shortcuts;

use crate::error::{Result, TxError};
use crate::fs::Transaction;

use clap::Subcommand;
use colored::Colorize;
use std::path::Path;

#[derive(Subcommand)]
pub enum Command {
    /// Write a file and create a directory; both happen or neither does.
    Hello,
    /// Same as `hello`, using the failing pass-through helpers.
    Shortcuts,
    /// Run a child transaction inside a parent; a failing parent undoes both.
    Nested(nested::NestedArgs),
}

/// Prints the outcome of a finished top-level transaction and releases it.
///
/// A transaction that did not commit becomes `TxError::RolledBack`.
pub(crate) fn report<C>(txn: Transaction<C>, label: &str, dir: &Path) -> Result<()> {
    let id = txn.id();
    let ok = txn.ok();

    if ok {
        println!("{} {} transaction successful, good job!", "✓".green().bold(), label);
    } else {
        println!("{} {} transaction failed!", "✗".red().bold(), label);
    }
    println!();
    txn.print_summary(dir);
    txn.end();

    if ok { Ok(()) } else { Err(TxError::RolledBack(id)) }
}
